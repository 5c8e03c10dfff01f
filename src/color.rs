use rand::Rng;
use rand::rngs::ThreadRng;

/// Qualitative "Paired" scale, strongest shades first.
pub const PALETTE: [&str; 11] = [
    "#1f78b4", "#33a02c", "#e31a1c", "#ff7f00", "#6a3d9a", "#b15928", "#a6cee3", "#b2df8a",
    "#fdbf6f", "#cab2d6", "#ffff99",
];

/// Hands out one color per network: the palette in order, then random colors.
pub struct ColorAllocator<R = ThreadRng> {
    next: usize,
    rng: R,
}

impl ColorAllocator<ThreadRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for ColorAllocator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ColorAllocator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { next: 0, rng }
    }

    pub fn next_color(&mut self) -> String {
        if let Some(color) = PALETTE.get(self.next) {
            self.next += 1;
            return (*color).to_string();
        }

        // Palette exhausted; random colors may repeat.
        let rgb: u32 = self.rng.gen_range(0..=0xFF_FFFF);
        format!("#{rgb:06x}")
    }
}
