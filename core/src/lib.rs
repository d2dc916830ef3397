pub mod display;
pub mod input;
pub mod log;
pub mod machine;
pub mod observer;
pub mod pacer;
pub mod platform;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod state;

pub mod prelude {
    pub use crate::display::{DisplayGeometry, DisplayRequest};
    pub use crate::input::InputSource;
    pub use crate::log::Log;
    pub use crate::machine::{GameInfo, InputButton, Machine, MachineOptions};
    pub use crate::platform::{Clock, InitError, Platform};
    pub use crate::render::{Render2D, Render3D, Renderer, Renderers};
    pub use crate::scheduler::{Context, Session, SessionError, SessionOptions};
    pub use crate::session::{SessionState, UiCommand};
    pub use crate::state::{BlockFile, BlockWriter, Slot, StateError, StateStore};
}
