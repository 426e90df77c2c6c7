// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod admin_handler;
pub mod health_handler;
pub mod proxy_handler;
