use winit::dpi::PhysicalSize;

/// Settings for a window this crate creates itself.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub initial_size: PhysicalSize<u32>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "yuvsink".to_string(),
            initial_size: PhysicalSize::new(720, 576),
        }
    }
}
