pub mod auth;
pub mod comments;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod posts;
pub mod projection;
pub mod reactions;

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use ripple_db::Database;
    use ripple_gateway::dispatcher::Dispatcher;
    use ripple_types::api::Claims;
    use uuid::Uuid;

    use crate::auth::AppStateInner;

    pub fn test_state() -> (Arc<AppStateInner>, Dispatcher) {
        let dispatcher = Dispatcher::new();
        let state = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
            dispatcher: dispatcher.clone(),
        });
        (state, dispatcher)
    }

    /// Creates the user row and returns claims acting as that user.
    pub fn claims_for(state: &AppStateInner, username: &str) -> Claims {
        let id = Uuid::new_v4();
        state.db.create_user(&id.to_string(), username, "hash").unwrap();
        Claims {
            sub: id,
            username: username.into(),
            exp: 4102444800,
        }
    }
}
