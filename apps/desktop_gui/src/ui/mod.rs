//! UI layer: app shell, screens, and modal dialogs.

pub mod app;

pub use app::DesktopGuiApp;
