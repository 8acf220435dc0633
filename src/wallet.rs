// Simulated wallet gate. No chain access: connecting waits a moment and
// hands back a fixed demo profile.

use crate::feed::types::User;
use std::time::Duration;

/// Outcome of a connect attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum GateResult {
    Granted(User),
    /// Connected, but the FIN balance is below the threshold.
    InsufficientBalance { user: User, required: u64 },
}

pub fn demo_user() -> User {
    User {
        id: "user_1".to_string(),
        name: "Base Navigator".to_string(),
        avatar: None,
        wallet_address: "0x3f5...8e1a".to_string(),
        fin_token_balance: 2500,
    }
}

pub fn has_access(user: &User, min_balance: u64) -> bool {
    user.fin_token_balance >= min_balance
}

pub fn check_access(user: User, min_balance: u64) -> GateResult {
    if has_access(&user, min_balance) {
        GateResult::Granted(user)
    } else {
        GateResult::InsufficientBalance {
            user,
            required: min_balance,
        }
    }
}

/// Simulate connecting a wallet and checking the token balance.
///
/// A previously saved profile is reused (so edits to the display name
/// survive reconnects), otherwise the demo profile is issued.
pub async fn connect(saved: Option<User>, delay: Duration, min_balance: u64) -> GateResult {
    tokio::time::sleep(delay).await;
    let user = saved.unwrap_or_else(demo_user);
    tracing::info!(address = %user.wallet_address, balance = user.fin_token_balance, "wallet connected");
    check_access(user, min_balance)
}
