//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Configured converter chains for each side of a call.

use crate::converter::chain::ConverterChain;
use crate::converter::json::JsonConverter;
use crate::converter::text::TextConverter;
use crate::converter::traits::{
    ArgumentResolver, ErrorTranslator, RequestArgumentConverter, ResponseConverter,
    ReturnValueConverter,
};
use crate::converter::translate::{FrameworkErrorTranslator, RemoteErrorTranslator};
use std::sync::Arc;

/// Chains used by a service supervisor.
///
/// The default registers JSON first, then plain text.
#[derive(Clone, Debug)]
pub struct ServerConverters {
    /// Inbound argument decoding.
    pub argument_resolvers: ConverterChain<dyn ArgumentResolver>,
    /// Outbound result and error encoding.
    pub return_value_converters: ConverterChain<dyn ReturnValueConverter>,
}

impl ServerConverters {
    /// Creates a set with empty chains.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            argument_resolvers: ConverterChain::new(),
            return_value_converters: ConverterChain::new(),
        }
    }
}

impl Default for ServerConverters {
    fn default() -> Self {
        let json = Arc::new(JsonConverter::new());
        let text = Arc::new(TextConverter::new());
        Self {
            argument_resolvers: ConverterChain::new()
                .with(json.clone() as Arc<dyn ArgumentResolver>)
                .with(text.clone() as Arc<dyn ArgumentResolver>),
            return_value_converters: ConverterChain::new()
                .with(json as Arc<dyn ReturnValueConverter>)
                .with(text as Arc<dyn ReturnValueConverter>),
        }
    }
}

/// Chains used by an RPC client.
///
/// The default registers JSON first, then plain text, and translates
/// framework error classes before falling back to remote errors.
#[derive(Clone, Debug)]
pub struct ClientConverters {
    /// Outbound argument encoding.
    pub request_argument_converters: ConverterChain<dyn RequestArgumentConverter>,
    /// Inbound result and error decoding.
    pub response_converters: ConverterChain<dyn ResponseConverter>,
    /// Error payload translation.
    pub error_translators: ConverterChain<dyn ErrorTranslator>,
}

impl ClientConverters {
    /// Creates a set with empty chains.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            request_argument_converters: ConverterChain::new(),
            response_converters: ConverterChain::new(),
            error_translators: ConverterChain::new(),
        }
    }
}

impl Default for ClientConverters {
    fn default() -> Self {
        let json = Arc::new(JsonConverter::new());
        let text = Arc::new(TextConverter::new());
        Self {
            request_argument_converters: ConverterChain::new()
                .with(json.clone() as Arc<dyn RequestArgumentConverter>)
                .with(text.clone() as Arc<dyn RequestArgumentConverter>),
            response_converters: ConverterChain::new()
                .with(json as Arc<dyn ResponseConverter>)
                .with(text as Arc<dyn ResponseConverter>),
            error_translators: ConverterChain::new()
                .with(Arc::new(FrameworkErrorTranslator) as Arc<dyn ErrorTranslator>)
                .with(Arc::new(RemoteErrorTranslator) as Arc<dyn ErrorTranslator>),
        }
    }
}
