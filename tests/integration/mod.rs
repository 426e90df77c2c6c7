// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod admin_test;
pub mod admission_test;
pub mod cache_invalidation_test;
pub mod health_check;
pub mod helpers;
pub mod quota_test;
