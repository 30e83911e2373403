// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::sync::{Arc, Mutex};

/// A piece of state shared between threads (CPU thread, compositor thread,
/// audio callback, NIC reader tasks). Critical sections held under the
/// inner mutex are expected to be short: snapshot in, compute out.
pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}
