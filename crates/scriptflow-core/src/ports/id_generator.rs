//! IdGenerator port - ID 生成の抽象化
//!
//! プロセスインスタンスと実行の ID を払い出します。
//! テスト容易性のために、trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（Clock のタイムスタンプ + 乱数部）

use crate::domain::ids::{ExecutionId, ProcessInstanceId};
use crate::ports::Clock;
use ulid::Ulid;

pub trait IdGenerator: Send + Sync {
    fn generate_process_instance_id(&self) -> ProcessInstanceId;

    fn generate_execution_id(&self) -> ExecutionId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// タイムスタンプ部は Clock から取るので、テストでは `FixedClock` で固定できます。
/// 乱数部が ID の一意性を保ちます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_process_instance_id(&self) -> ProcessInstanceId {
        ProcessInstanceId::from(self.next_ulid())
    }

    fn generate_execution_id(&self) -> ExecutionId {
        ExecutionId::from(self.next_ulid())
    }
}
