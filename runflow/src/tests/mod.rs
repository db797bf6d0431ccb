// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod test_edit;
mod test_persist;
mod utils;
