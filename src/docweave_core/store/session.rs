// Copyright 2024 Vincent Chan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// A client session shared by every operation issued on its behalf.
///
/// The store flips the transaction flag in `start_transaction`,
/// `commit_transaction` and `abort_transaction`.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {

    pub fn new() -> Session {
        Session {
            inner: Arc::new(SessionInner {
                id: Uuid::new_v4(),
                in_transaction: AtomicBool::new(false),
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    #[inline]
    pub fn in_transaction(&self) -> bool {
        self.inner.in_transaction.load(Ordering::SeqCst)
    }

    /// Returns the previous value.
    pub fn set_in_transaction(&self, value: bool) -> bool {
        self.inner.in_transaction.swap(value, Ordering::SeqCst)
    }

}

impl Default for Session {

    fn default() -> Self {
        Session::new()
    }

}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}

struct SessionInner {
    id: Uuid,
    in_transaction: AtomicBool,
}

/// `true` only for a session with a running transaction.
pub(crate) fn has_active_transaction(session: Option<&Session>) -> bool {
    session.map_or(false, Session::in_transaction)
}
