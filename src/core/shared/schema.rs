diesel::table! {
    users (id) {
        id -> Uuid,
        name -> Text,
        email -> Text,
        password_hash -> Text,
        profile_image_url -> Nullable<Text>,
        role -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    tasks (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        priority -> Text,
        status -> Text,
        due_date -> Timestamptz,
        assigned_to -> Array<Uuid>,
        created_by -> Uuid,
        attachments -> Array<Text>,
        todo_checklist -> Jsonb,
        progress -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, tasks);
