// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod billing;
pub mod comments;
pub mod friends;
pub mod health;
pub mod livestreams;
pub mod metrics;
pub mod notifications;
