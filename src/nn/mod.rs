//! State encoding and the online-trained policy/value predictor.

pub mod encoder;
pub mod mlp;
pub mod predictor;

pub use encoder::encode;
pub use mlp::{MlpConfig, MlpRegressor};
pub use predictor::{Prediction, Predictor};
