use egui::Color32;

/// Number of categories the engine samples per pixel
pub const PALETTE_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub name: &'static str,
    pub colors: [Color32; PALETTE_SIZE],
}

pub const PALETTES: [Palette; 4] = [
    Palette {
        name: "Old desert",
        colors: [
            Color32::from_rgb(0xFF, 0xFF, 0x88),
            Color32::from_rgb(0xFF, 0xAA, 0x88),
            Color32::from_rgb(0xAA, 0x88, 0x44),
            Color32::from_rgb(0x00, 0x00, 0x00),
        ],
    },
    Palette {
        name: "Gaudy Gaudi",
        colors: [
            Color32::from_rgb(0xF0, 0x32, 0xBC),
            Color32::from_rgb(0x86, 0x4B, 0xE7),
            Color32::from_rgb(0xF9, 0xF8, 0x71),
            Color32::from_rgb(0x00, 0x00, 0x00),
        ],
    },
    Palette {
        name: "Noir",
        colors: [
            Color32::from_rgb(0x5F, 0x3E, 0x53),
            Color32::from_rgb(0xCA, 0x9D, 0x53),
            Color32::from_rgb(0x2B, 0x35, 0x41),
            Color32::from_rgb(0x8C, 0x7F, 0x78),
        ],
    },
    Palette {
        name: "Monochrome",
        colors: [
            Color32::from_rgb(0xF4, 0xF4, 0xF4),
            Color32::from_rgb(0x9F, 0x9F, 0x9F),
            Color32::from_rgb(0x44, 0x44, 0x44),
            Color32::from_rgb(0x0A, 0x0A, 0x0A),
        ],
    },
];

/// Cycles through the built-in palettes
#[derive(Debug, Clone, Default)]
pub struct PaletteBook {
    current: usize,
}

impl PaletteBook {
    pub fn new(index: usize) -> Self {
        Self {
            current: index % PALETTES.len(),
        }
    }

    pub fn index(&self) -> usize {
        self.current
    }

    pub fn active(&self) -> &Palette {
        &PALETTES[self.current]
    }

    pub fn active_colors(&self) -> [Color32; PALETTE_SIZE] {
        self.active().colors
    }

    pub fn next(&mut self) {
        self.current = (self.current + 1) % PALETTES.len();
        log::info!("Palette: {}", self.active().name);
    }

    pub fn prev(&mut self) {
        self.current = (self.current + PALETTES.len() - 1) % PALETTES.len();
        log::info!("Palette: {}", self.active().name);
    }

    /// Active palette as flat `r, g, b` bytes, the layout the encoder expects
    pub fn export_rgb(&self) -> Vec<u8> {
        self.active()
            .colors
            .iter()
            .flat_map(|c| [c.r(), c.g(), c.b()])
            .collect()
    }
}
