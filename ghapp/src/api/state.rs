use std::sync::Arc;

use secrecy::SecretString;

use crate::App;

#[derive(Clone)]
pub struct RequestState {
    pub app: Arc<App>,
    pub secret: SecretString,
}
