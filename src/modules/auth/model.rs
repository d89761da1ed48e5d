pub use campusly_models::auth::{
    ForgotPasswordRequest, InviteRegisterRequest, LoginRequest, LoginResponse, MessageResponse,
    OtpPurpose, RefreshTokenRequest, RegisterRequest, RegisterResponse, ResendOtpRequest,
    ResetPasswordRequest, TokenResponse, VerifyOtpRequest,
};
