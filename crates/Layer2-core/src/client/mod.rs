//! # Client
//!
//! 레지스트리에 등록된 플러그인을 하나의 루트 객체(`WebexClient`)로 구성합니다.
//!
//! ```ignore
//! webex_plugins::register_all(&global_registry())?;
//!
//! let webex = WebexClient::init(
//!     ClientOptions::new()
//!         .credentials(token)
//!         .config(json!({"trackingIdPrefix": "my-app"})),
//! )
//! .await?;
//!
//! webex.on("ready", |_| println!("ready"));
//! ```

mod composer;
mod options;

pub(crate) use composer::ClientInner;
pub use composer::WebexClient;
pub use options::{core_defaults, ClientOptions};
