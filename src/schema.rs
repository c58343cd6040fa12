// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use diesel::allow_tables_to_appear_in_same_query;
use diesel::table;

table! {
    livestreams (id) {
        id -> Varchar,
        creator_id -> Varchar,
        creator_name -> Varchar,
        creator_photo -> Nullable<Varchar>,
        title -> Varchar,
        description -> Nullable<Text>,
        status -> Varchar,
        viewer_count -> BigInt,
        tags -> Array<Text>,
        is_premium -> Bool,
        started_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

table! {
    comments (id) {
        id -> Varchar,
        livestream_id -> Varchar,
        author_id -> Varchar,
        author_name -> Varchar,
        author_photo -> Nullable<Varchar>,
        content -> Text,
        likes -> BigInt,
        created_at -> Timestamptz,
    }
}

// Requests live in the recipient's inbox, keyed by sender
table! {
    friend_requests (recipient_id, sender_id) {
        recipient_id -> Varchar,
        sender_id -> Varchar,
        sender_name -> Varchar,
        sender_photo -> Nullable<Varchar>,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

table! {
    friends (user_id, friend_id) {
        user_id -> Varchar,
        friend_id -> Varchar,
        created_at -> Timestamptz,
    }
}

table! {
    notification_settings (user_id) {
        user_id -> Varchar,
        follow_enabled -> Bool,
        like_enabled -> Bool,
        comment_enabled -> Bool,
        challenge_enabled -> Bool,
        payment_enabled -> Bool,
        email_enabled -> Bool,
        updated_at -> Timestamptz,
    }
}

table! {
    users (id) {
        id -> Varchar,
        email -> Nullable<Varchar>,
        tier -> Nullable<Varchar>,
        stripe_customer_id -> Nullable<Varchar>,
        stripe_subscription_id -> Nullable<Varchar>,
        updated_at -> Timestamptz,
    }
}

allow_tables_to_appear_in_same_query!(
    livestreams,
    comments,
    friend_requests,
    friends,
    notification_settings,
    users,
);
