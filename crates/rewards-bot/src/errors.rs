// Copyright 2026 Boundless Foundation, Inc.
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

/// Errors that carry a stable code, printed in logs ahead of the message.
pub trait CodedError: std::error::Error {
    fn code(&self) -> &str;
}

/// Implements [`std::fmt::Debug`] as `<code> <display>` for a [`CodedError`].
#[macro_export]
macro_rules! impl_coded_debug {
    ($ty:ident) => {
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} {}", $crate::errors::CodedError::code(self), self)
            }
        }
    };
}
