//! Lights and the packed light array
//!
//! [`LightManager`] owns every [`Light`], picks the shadow-casting one, and repacks
//! all light records into one uniform array once per frame.

pub mod light;
pub mod light_manager;

use slotmap::new_key_type;

new_key_type! {
    pub struct LightHandle;
}

pub use light::{Light, LightKind};
pub use light_manager::LightManager;
