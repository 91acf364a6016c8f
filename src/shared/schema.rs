diesel::table! {
    users (id) {
        id -> Uuid,
        username -> Text,
        first_name -> Text,
        last_name -> Text,
        email -> Text,
        password_hash -> Text,
        is_active -> Bool,
        is_staff -> Bool,
        date_joined -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    customers (id) {
        id -> Uuid,
        kind -> Text,
        cpf -> Text,
        cnpj -> Text,
        name -> Text,
        trade_name -> Text,
        postal_code -> Text,
        state -> Text,
        city -> Text,
        district -> Text,
        street -> Text,
        number -> Text,
        complement -> Text,
        phone -> Text,
        email -> Text,
        created_by -> Nullable<Uuid>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    tickets (id) {
        id -> Uuid,
        slug -> Text,
        title -> Text,
        description -> Text,
        customer_id -> Uuid,
        status -> Text,
        priority -> Text,
        share_mode -> Text,
        share_password_hash -> Nullable<Text>,
        expires_at -> Nullable<Timestamptz>,
        created_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    ticket_videos (id) {
        id -> Uuid,
        ticket_id -> Uuid,
        file_path -> Text,
        original_name -> Text,
        size_bytes -> Int8,
        description -> Text,
        uploaded_by -> Nullable<Uuid>,
        uploaded_at -> Timestamptz,
    }
}

diesel::table! {
    ticket_comments (id) {
        id -> Uuid,
        ticket_id -> Uuid,
        body -> Text,
        author_id -> Nullable<Uuid>,
        author_name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(tickets -> customers (customer_id));
diesel::joinable!(ticket_videos -> tickets (ticket_id));
diesel::joinable!(ticket_comments -> tickets (ticket_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    customers,
    tickets,
    ticket_videos,
    ticket_comments,
);
