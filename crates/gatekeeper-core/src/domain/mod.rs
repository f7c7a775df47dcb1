//! 계정 도메인 모델.

mod account;
mod principal;
mod role;

pub use account::{Account, AccountUpdate, NewAccount, PasswordDigest};
pub use principal::Principal;
pub use role::Role;
