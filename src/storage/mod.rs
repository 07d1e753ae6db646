// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// History storage module
//
// Provides a trait-based abstraction over where per-sensor history lives
// (memory, local JSON documents). All backends share the same sorted table
// and retention logic.

pub mod backend;
pub mod factory;
pub mod filesystem;
pub mod memory;
pub mod table;

pub use backend::HistoryStore;
pub use factory::BackendFactory;
pub use filesystem::{sensor_file_name, FilesystemHistoryStore};
pub use memory::MemoryHistoryStore;
pub use table::{HistoryRecord, HistoryTable, RecordId, StagedRecords};
