// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::{constants::*, Credential};
use async_trait::async_trait;
use loadreport_core::{Context, ProvideCredential, Result};
use log::debug;

/// EnvCredentialProvider loads credentials from environment variables.
///
/// `MINIO_ACCESS_KEY` / `MINIO_SECRET_KEY` are tried first, then
/// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`. A pair is only used when
/// both halves are set and non-empty; halves are never mixed across pairs.
#[derive(Debug, Default, Clone)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Create a new EnvCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        for (ak_key, sk_key) in [
            (MINIO_ACCESS_KEY, MINIO_SECRET_KEY),
            (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY),
        ] {
            if let (Some(ak), Some(sk)) = (ctx.env_var_non_empty(ak_key), ctx.env_var_non_empty(sk_key)) {
                debug!("loaded credential from {ak_key}");
                return Ok(Some(Credential::new(ak, sk)));
            }
        }

        Ok(None)
    }
}
