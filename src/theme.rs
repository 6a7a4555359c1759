use eframe::egui::Color32;

// Color Palette
pub const PRIMARY_BUTTON_BG: Color32 = Color32::from_rgb(76, 154, 255); // Vibrant blue for the download button
pub const PROGRESS_FILL: Color32 = PRIMARY_BUTTON_BG;

// Surfaces
pub const SECTION_BG: Color32 = Color32::from_rgb(248, 248, 248);

// Text Colors
pub const BUTTON_MAIN_TEXT: Color32 = Color32::from_rgb(255, 255, 255);
pub const MAIN_TEXT: Color32 = Color32::from_rgb(36, 36, 36);
pub const SECTION_TITLE: Color32 = Color32::from_rgb(90, 90, 96);
pub const TEXT_ERROR: Color32 = Color32::from_rgb(200, 30, 30);

// UI Elements
pub const BORDER_COLOR: Color32 = Color32::from_rgba_premultiplied(60, 60, 67, 15); // Subtle border

// Sizing & Spacing
pub const ROUNDING_FRAME: f32 = 4.0;
pub const ROUNDING_BUTTON: f32 = 6.0;
pub const MIN_SIZE_BUTTON: egui::Vec2 = egui::Vec2::new(120.0, 40.0);
pub const INPUT_HEIGHT: f32 = 32.0;
pub const BROWSE_BUTTON_WIDTH: f32 = 110.0;
pub const COMBO_WIDTH: f32 = 180.0;

pub const BUTTON_FONT_SIZE: f32 = 16.0;
