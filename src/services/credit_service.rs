//! 用户额度账本
//!
//! 服务端持有的按用户计数器。首次出现的用户获得初始额度，
//! 每次增强原子地扣减一次，额度为零时拒绝。

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};

/// 额度错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreditError {
    #[error("user {user_id} has no credits left")]
    Exhausted { user_id: String },
}

/// 额度账本
pub struct CreditLedger {
    balances: DashMap<String, u32>,
    initial_credits: u32,
}

impl CreditLedger {
    pub fn new(initial_credits: u32) -> Self {
        Self {
            balances: DashMap::new(),
            initial_credits,
        }
    }

    /// 查询余额（首次查询即开户）
    pub fn balance(&self, user_id: &str) -> u32 {
        *self
            .balances
            .entry(user_id.to_string())
            .or_insert(self.initial_credits)
    }

    /// 扣减一个额度，返回剩余额度
    ///
    /// 检查与扣减在同一个分片锁内完成
    pub fn try_consume(&self, user_id: &str) -> Result<u32, CreditError> {
        let mut balance = self
            .balances
            .entry(user_id.to_string())
            .or_insert(self.initial_credits);

        if *balance == 0 {
            debug!("Credit request rejected for user: {}", user_id);
            return Err(CreditError::Exhausted {
                user_id: user_id.to_string(),
            });
        }

        *balance -= 1;
        Ok(*balance)
    }

    /// 增加额度，返回新余额
    pub fn grant(&self, user_id: &str, amount: u32) -> u32 {
        let mut balance = self
            .balances
            .entry(user_id.to_string())
            .or_insert(self.initial_credits);
        *balance = balance.saturating_add(amount);
        info!("Granted {} credits to user: {} (balance={})", amount, user_id, *balance);
        *balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_first_sight_grants_initial_credits() {
        let ledger = CreditLedger::new(10);
        assert_eq!(ledger.balance("alice"), 10);
        assert_eq!(ledger.try_consume("bob"), Ok(9));
        assert_eq!(ledger.balance("bob"), 9);
    }

    #[test]
    fn test_rejects_at_zero() {
        let ledger = CreditLedger::new(2);
        assert_eq!(ledger.try_consume("u"), Ok(1));
        assert_eq!(ledger.try_consume("u"), Ok(0));
        assert_eq!(
            ledger.try_consume("u"),
            Err(CreditError::Exhausted { user_id: "u".to_string() })
        );
        assert_eq!(ledger.balance("u"), 0);
    }

    #[test]
    fn test_grant_saturates() {
        let ledger = CreditLedger::new(0);
        assert_eq!(ledger.grant("u", 5), 5);
        assert_eq!(ledger.grant("u", u32::MAX), u32::MAX);
    }

    #[test]
    fn test_concurrent_consumption_never_overdraws() {
        let ledger = CreditLedger::new(50);
        let successes = AtomicU32::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..20 {
                        if ledger.try_consume("shared").is_ok() {
                            successes.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(successes.load(Ordering::SeqCst), 50);
        assert_eq!(ledger.balance("shared"), 0);
    }
}
