// UI rendering modules
//
// split by panel to keep app.rs focused on state management:
// - tool_panel: checkpoint / latent / drag / mask controls (left panel)
// - image_panel: the interactive image view (center)
// - status_bar: session info (bottom)

pub mod image_panel;
pub mod status_bar;
pub mod tool_panel;
