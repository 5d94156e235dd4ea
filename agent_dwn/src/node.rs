// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use agent_did::Did;
use async_trait::async_trait;

use crate::error::Result;
use crate::message::DwnMessage;
use crate::reply::Reply;

/// The entry point of the DWN message engine.
///
/// Message validation, schema enforcement and permissions live behind this
/// trait; the agent only constructs messages and interprets the reply
/// envelope. [`MemNode`][crate::MemNode] implements it in memory for tests.
#[async_trait]
pub trait MessageSink: Send + Sync {
  /// Processes `message` under the `target` tenant, with an optional data
  /// payload accompanying a record write.
  async fn process(&self, target: &Did, message: DwnMessage, data: Option<Vec<u8>>) -> Result<Reply>;
}
