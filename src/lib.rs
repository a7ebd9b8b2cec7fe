// netradar - Network Radar: LAN devices on an animated terminal radar

pub mod app;
pub mod classify;
pub mod device;
pub mod discovery;
pub mod feed;
pub mod radar;
pub mod store;
pub mod theme;
pub mod ui;
