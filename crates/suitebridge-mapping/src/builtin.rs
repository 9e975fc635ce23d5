// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in mappings for the customer and invoice record families.

use crate::rule::{FieldKind, FieldRule, RecordMapping, Transform};

pub fn customer() -> RecordMapping {
    RecordMapping::new("customer")
        .field(FieldRule::new("entity_id", FieldKind::Text).path("entityId").required())
        .field(
            FieldRule::new("name", FieldKind::Text)
                .path("companyName")
                .path("altName"),
        )
        .field(FieldRule::new("email", FieldKind::Text).path("email"))
        .field(FieldRule::new("phone", FieldKind::Text).path("phone"))
        .field(
            FieldRule::new("active", FieldKind::Boolean)
                .path("isInactive")
                .transform(Transform::InvertBool),
        )
        .field(FieldRule::new("is_person", FieldKind::Boolean).path("isPerson"))
        .field(FieldRule::new("status", FieldKind::Reference).path("entityStatus"))
        .field(FieldRule::new("subsidiary", FieldKind::Reference).path("subsidiary"))
        .field(FieldRule::new("currency", FieldKind::Reference).path("currency"))
        .field(FieldRule::new("parent", FieldKind::Reference).path("parent"))
        .field(FieldRule::new("balance", FieldKind::Decimal).path("balance"))
        .field(FieldRule::new("credit_limit", FieldKind::Decimal).path("creditLimit"))
        .field(FieldRule::new("created_at", FieldKind::Timestamp).path("dateCreated"))
        .field(FieldRule::new("updated_at", FieldKind::Timestamp).path("lastModifiedDate"))
}

pub fn invoice() -> RecordMapping {
    RecordMapping::new("invoice")
        .field(FieldRule::new("tran_id", FieldKind::Text).path("tranId").required())
        .field(FieldRule::new("customer", FieldKind::Reference).path("entity"))
        .field(FieldRule::new("tran_date", FieldKind::Date).path("tranDate"))
        .field(FieldRule::new("due_date", FieldKind::Date).path("dueDate"))
        .field(
            FieldRule::new("status", FieldKind::Text)
                .path("status")
                .transform(Transform::value_map([
                    ("open", "open"),
                    ("paidInFull", "paid"),
                    ("pendingApproval", "pending_approval"),
                    ("rejected", "rejected"),
                    ("voided", "voided"),
                ])),
        )
        .field(FieldRule::new("memo", FieldKind::Text).path("memo"))
        .field(FieldRule::new("currency", FieldKind::Reference).path("currency"))
        .field(FieldRule::new("subsidiary", FieldKind::Reference).path("subsidiary"))
        .field(FieldRule::new("subtotal", FieldKind::Decimal).path("subTotal"))
        .field(FieldRule::new("total", FieldKind::Decimal).path("total"))
        .field(FieldRule::new("amount_remaining", FieldKind::Decimal).path("amountRemaining"))
        .field(FieldRule::new("created_at", FieldKind::Timestamp).path("createdDate"))
        .field(FieldRule::new("updated_at", FieldKind::Timestamp).path("lastModifiedDate"))
}
