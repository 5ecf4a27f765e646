//! Double-buffered frame pacing
//!
//! Two framebuffers sit side by side in VRAM, each with its own command
//! chain. While the GPU walks one chain into one framebuffer, the frame
//! loop builds the other:
//!
//! ```text
//! frame n:    build chain 0 ─► wait vblank ─► show fb 1 ─► submit chain 0
//! frame n+1:  build chain 1 ─► wait vblank ─► show fb 0 ─► submit chain 1
//! ```
//!
//! [`FramePacer::end_frame`] is the only place the loop waits for the
//! display.

use psxio_hal::dma::DmaChannel;
use psxio_hal::gpu::GpuPorts;
use psxio_hal::irq::{InterruptController, Irq};
use psxio_protocol::{gp0, gp1};

use super::chain::{CommandChain, CHAIN_BUFFER_SIZE};
use super::dma::{DmaEngine, DmaError};
use crate::config::VideoConfig;
use crate::pad::InputState;

/// Words the drawing environment preamble takes, tags included
pub const PREAMBLE_WORDS: usize = 5 + 4;

/// Framebuffer being drawn this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameTarget {
    /// Framebuffer index (0 or 1)
    pub index: usize,
    /// Top-left corner in VRAM
    pub x: u16,
    pub y: u16,
}

/// State owned by the frame loop
///
/// Holds both command chains and the button history. Keep it in one place
/// for the whole run: a submitted chain is read by DMA in place.
pub struct FrameContext<const N: usize = CHAIN_BUFFER_SIZE> {
    chains: [CommandChain<N>; 2],
    current: usize,
    last_submitted: Option<usize>,
    frame_count: u32,
    input: InputState,
}

impl<const N: usize> FrameContext<N> {
    pub const fn new() -> Self {
        Self {
            chains: [CommandChain::new(), CommandChain::new()],
            current: 0,
            last_submitted: None,
            frame_count: 0,
            input: InputState::new(),
        }
    }

    /// Frames submitted so far
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Framebuffer index the next frame draws into
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn chain(&self, index: usize) -> &CommandChain<N> {
        &self.chains[index]
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }
}

impl<const N: usize> Default for FrameContext<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// One frame being built
///
/// Borrows the idle chain and the button history from the context.
pub struct Frame<'c, const N: usize = CHAIN_BUFFER_SIZE> {
    pub chain: &'c mut CommandChain<N>,
    pub input: &'c mut InputState,
    pub target: FrameTarget,
}

/// Paces the frame loop against vertical blank
pub struct FramePacer<G: GpuPorts, C: DmaChannel, I: InterruptController> {
    dma: DmaEngine<G, C>,
    irq: I,
    video: VideoConfig,
}

impl<G: GpuPorts, C: DmaChannel, I: InterruptController> FramePacer<G, C, I> {
    pub fn new(dma: DmaEngine<G, C>, irq: I, video: VideoConfig) -> Self {
        Self { dma, irq, video }
    }

    /// VRAM position of framebuffer `index`
    pub fn framebuffer_origin(&self, index: usize) -> (u16, u16) {
        (index as u16 * self.video.width, 0)
    }

    /// Start a frame in the idle chain
    ///
    /// The chain is rewound (not zeroed) and opened with the drawing
    /// environment for the off-screen framebuffer, plus a clear when a
    /// clear colour is configured.
    pub fn begin_frame<'c, const N: usize>(&self, ctx: &'c mut FrameContext<N>) -> Frame<'c, N> {
        let index = ctx.current;
        let (x, y) = self.framebuffer_origin(index);
        let (width, height) = (self.video.width, self.video.height);

        let chain = &mut ctx.chains[index];
        chain.reset();

        let env = chain.allocate(4);
        env[0] = gp0::texpage(0, true, false);
        env[1] = gp0::draw_area_top_left(x, y);
        env[2] = gp0::draw_area_bottom_right(x + width - 1, y + height - 1);
        env[3] = gp0::draw_offset(x, y);

        if let Some(color) = self.video.clear_color {
            let fill = chain.allocate(3);
            fill[0] = color.to_word() | gp0::vram_fill();
            fill[1] = gp0::xy(x as i32, y as i32);
            fill[2] = gp0::xy(width as i32, height as i32);
        }

        Frame {
            chain,
            input: &mut ctx.input,
            target: FrameTarget { index, x, y },
        }
    }

    /// Finish the current frame and hand it to the GPU
    ///
    /// Terminates the chain, waits for GP0 and then for vertical blank,
    /// shows the framebuffer drawn by the previous submission and starts
    /// the DMA walk of this one.
    pub fn end_frame<const N: usize>(&mut self, ctx: &mut FrameContext<N>) -> Result<(), DmaError> {
        let index = ctx.current;
        ctx.chains[index].terminate();

        self.dma.wait_gp0_ready();
        self.wait_vblank();

        if let Some(previous) = ctx.last_submitted {
            // The previous chain has finished drawing once its DMA is done
            self.dma.wait_done();
            let (x, y) = self.framebuffer_origin(previous);
            self.dma.gpu_mut().write_gp1(gp1::display_start(x, y));
        }

        self.dma.transfer_linked(&mut ctx.chains[index])?;

        ctx.last_submitted = Some(index);
        ctx.current = index ^ 1;
        ctx.frame_count = ctx.frame_count.wrapping_add(1);
        Ok(())
    }

    /// Block until the next vertical blank and clear its latch
    pub fn wait_vblank(&mut self) {
        while !self.irq.is_pending(Irq::VBlank) {
            core::hint::spin_loop();
        }
        self.irq.acknowledge(Irq::VBlank);
    }

    pub fn video(&self) -> &VideoConfig {
        &self.video
    }

    pub fn dma(&self) -> &DmaEngine<G, C> {
        &self.dma
    }

    pub fn dma_mut(&mut self) -> &mut DmaEngine<G, C> {
        &mut self.dma
    }

    pub fn irq(&self) -> &I {
        &self.irq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimDma, SimGpu, SimIrq};
    use psxio_hal::dma::DmaControl;
    use psxio_protocol::gp0::Rgb;
    use psxio_protocol::pad::Buttons;

    type SimPacer = FramePacer<SimGpu, SimDma, SimIrq>;

    fn pacer(video: VideoConfig) -> SimPacer {
        FramePacer::new(
            DmaEngine::new(SimGpu::new(), SimDma::with_busy_polls(2)),
            SimIrq::with_vblank_period(3),
            video,
        )
    }

    #[test]
    fn test_preamble_targets_offscreen_buffer() {
        let pacer = pacer(VideoConfig::default());
        let mut ctx: FrameContext<64> = FrameContext::new();

        let frame = pacer.begin_frame(&mut ctx);
        assert_eq!(frame.target, FrameTarget { index: 0, x: 0, y: 0 });

        let packets: Vec<&[u32]> = frame.chain.packets().collect();
        assert_eq!(packets.len(), 2);
        assert_eq!(
            packets[0],
            &[
                gp0::texpage(0, true, false),
                gp0::draw_area_top_left(0, 0),
                gp0::draw_area_bottom_right(319, 239),
                gp0::draw_offset(0, 0),
            ]
        );
        assert_eq!(
            packets[1],
            &[
                Rgb::new(64, 64, 64).to_word() | gp0::vram_fill(),
                gp0::xy(0, 0),
                gp0::xy(320, 240),
            ]
        );
        assert_eq!(frame.chain.len(), PREAMBLE_WORDS);
    }

    #[test]
    fn test_no_clear_without_color() {
        let pacer = pacer(VideoConfig {
            clear_color: None,
            ..VideoConfig::default()
        });
        let mut ctx: FrameContext<64> = FrameContext::new();

        let frame = pacer.begin_frame(&mut ctx);
        assert_eq!(frame.chain.packets().count(), 1);
    }

    #[test]
    fn test_frames_alternate() {
        let mut pacer = pacer(VideoConfig::default());
        let mut ctx: FrameContext<64> = FrameContext::new();

        for n in 0..4usize {
            let frame = pacer.begin_frame(&mut ctx);
            assert_eq!(frame.target.index, n % 2);
            assert_eq!(frame.target.x, (n % 2) as u16 * 320);
            frame.chain.allocate(1)[0] = gp0::rectangle(false, false, false);
            pacer.end_frame(&mut ctx).unwrap();
        }

        assert_eq!(ctx.frame_count(), 4);
        assert_eq!(pacer.irq().vblanks_acknowledged(), 4);

        // Each submission walks the chain built that frame
        let transfers = pacer.dma().channel().transfers();
        assert_eq!(transfers.len(), 4);
        assert_eq!(transfers[0].address, ctx.chain(0).bus_address());
        assert_eq!(transfers[1].address, ctx.chain(1).bus_address());
        assert_eq!(transfers[2].address, ctx.chain(0).bus_address());
        for transfer in transfers {
            assert_eq!(
                transfer.control,
                DmaControl::FROM_RAM | DmaControl::MODE_LIST | DmaControl::ENABLE
            );
        }
        assert!(!pacer.dma().channel().overlapped());
    }

    #[test]
    fn test_display_follows_previous_submission() {
        let mut pacer = pacer(VideoConfig::default());
        let mut ctx: FrameContext<64> = FrameContext::new();

        // First frame has nothing finished to show yet
        pacer.begin_frame(&mut ctx);
        pacer.end_frame(&mut ctx).unwrap();
        assert!(pacer.dma().gpu().gp1().is_empty());

        pacer.begin_frame(&mut ctx);
        pacer.end_frame(&mut ctx).unwrap();
        pacer.begin_frame(&mut ctx);
        pacer.end_frame(&mut ctx).unwrap();

        assert_eq!(
            pacer.dma().gpu().gp1(),
            &[gp1::display_start(0, 0), gp1::display_start(320, 0)]
        );
    }

    #[test]
    fn test_end_frame_terminates_chain() {
        let mut pacer = pacer(VideoConfig::default());
        let mut ctx: FrameContext<64> = FrameContext::new();

        pacer.begin_frame(&mut ctx);
        pacer.end_frame(&mut ctx).unwrap();

        let chain = ctx.chain(0);
        assert!(chain.is_terminated());
        assert_eq!(chain.packets().count(), 3);
    }

    #[test]
    fn test_frame_carries_input() {
        let pacer = pacer(VideoConfig::default());
        let mut ctx: FrameContext<64> = FrameContext::new();

        let frame = pacer.begin_frame(&mut ctx);
        assert_eq!(frame.input.update(Buttons::CIRCLE), Buttons::CIRCLE);
        assert_eq!(ctx.input().pressed(), Buttons::CIRCLE);
    }

    #[test]
    fn test_vblank_wait_polls_latch() {
        let mut pacer = pacer(VideoConfig::default());
        pacer.wait_vblank();
        pacer.wait_vblank();

        assert_eq!(pacer.irq().vblanks_acknowledged(), 2);
        assert_eq!(pacer.irq().vblank_polls(), 8);
    }
}
