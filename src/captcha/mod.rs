// 人机验证

mod turnstile;

pub use turnstile::{
    TurnstileErrorCode, TurnstileVerifier, TurnstileVerifyResponse, is_captcha_required,
};
