table! {
    questions (id) {
        id -> Int4,
        text -> Text,
        difficulty -> Varchar,
        #[sql_name = "type"]
        type_ -> Varchar,
        answer -> Text,
        options -> Nullable<Array<Text>>,
        correct_index -> Nullable<Int4>,
        created_at -> Timestamptz,
        used_at -> Nullable<Timestamptz>,
    }
}
