pub mod api;
pub mod session;
pub mod terminal;
pub mod view;

pub use api::{ ClientError, GatewayApi, HttpGatewayApi };
pub use session::{ ChatSession, BANNER_TTL, GREETING };
pub use view::{ BannerId, ChatView };
