// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! External payment processor integrations.

pub mod razorpay;

pub use razorpay::{CreatedOrder, OrderRequest, PaymentProcessor, RazorpayClient, RazorpayError};
