//! Audio Binding - 音频输出的单一所有者登记
//!
//! 同一时刻最多一个会话拥有输出。每次 acquire/release 都会递增代数，
//! 持有旧票据的更新循环或网络回调据此判断自己是否已过期。

use std::sync::{Mutex, PoisonError};

/// 绑定票据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTicket {
    session_id: String,
    generation: u64,
}

impl BindingTicket {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct Slot {
    owner: Option<String>,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct AudioBinding {
    slot: Mutex<Slot>,
}

impl AudioBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// 将输出绑定给会话
    ///
    /// 返回新票据，以及被顶替的其他会话（如有）
    pub fn acquire(&self, session_id: &str) -> (BindingTicket, Option<String>) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        let previous = slot
            .owner
            .replace(session_id.to_string())
            .filter(|owner| owner != session_id);
        let ticket = BindingTicket {
            session_id: session_id.to_string(),
            generation: slot.generation,
        };
        (ticket, previous)
    }

    /// 会话释放输出；非所有者调用时无效果
    pub fn release(&self, session_id: &str) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.owner.as_deref() != Some(session_id) {
            return false;
        }
        slot.owner = None;
        slot.generation += 1;
        true
    }

    /// 票据是否仍是最新一次绑定
    pub fn is_current(&self, ticket: &BindingTicket) -> bool {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.generation == ticket.generation
            && slot.owner.as_deref() == Some(ticket.session_id.as_str())
    }

    pub fn owner(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .owner
            .clone()
    }

    pub fn is_owner(&self, session_id: &str) -> bool {
        self.owner().as_deref() == Some(session_id)
    }
}
