// handlers/protected/mod.rs - Handlers behind the identity middleware
//
// Every handler here receives an `Extension<Principal>` injected by
// `middleware::identity_middleware`, and must evaluate the authorization
// policy before touching the store.

pub mod profiles;
