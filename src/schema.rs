diesel::table! {
    shop_users (id) {
        id -> Int4,
        #[max_length = 150]
        username -> Varchar,
        #[max_length = 255]
        name -> Varchar,
        password -> Text,
        #[max_length = 20]
        status -> Varchar,
        #[max_length = 50]
        contact_phone -> Varchar,
        #[max_length = 255]
        contact_email -> Varchar,
        #[max_length = 120]
        bank_name -> Varchar,
        #[max_length = 64]
        bank_account -> Varchar,
        #[max_length = 64]
        totp_secret -> Nullable<Varchar>,
        #[max_length = 64]
        totp_pending_secret -> Nullable<Varchar>,
        must_change_password -> Bool,
        wallet_balance -> Numeric,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    login_attempts (id) {
        id -> Int4,
        #[max_length = 150]
        username -> Varchar,
        user_id -> Nullable<Int4>,
        #[max_length = 64]
        ip_address -> Nullable<Varchar>,
        #[max_length = 512]
        user_agent -> Varchar,
        success -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    games (id) {
        id -> Int4,
        shop_id -> Int4,
        #[max_length = 40]
        game_code -> Varchar,
        bet_amount -> Numeric,
        win_amount -> Numeric,
        num_players -> Int4,
        #[max_length = 20]
        status -> Varchar,
        winners -> Jsonb,
        created_at -> Timestamptz,
        started_at -> Nullable<Timestamptz>,
        ended_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    cartellas (id) {
        id -> Int4,
        game_id -> Int4,
        cartella_number -> Int4,
        board -> Jsonb,
        drawn_numbers -> Jsonb,
    }
}

diesel::table! {
    transactions (id) {
        id -> Uuid,
        shop_id -> Int4,
        #[max_length = 30]
        tx_type -> Varchar,
        amount -> Numeric,
        balance_before -> Numeric,
        balance_after -> Numeric,
        #[max_length = 120]
        reference -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(login_attempts -> shop_users (user_id));
diesel::joinable!(games -> shop_users (shop_id));
diesel::joinable!(cartellas -> games (game_id));
diesel::joinable!(transactions -> shop_users (shop_id));

diesel::allow_tables_to_appear_in_same_query!(
    shop_users,
    login_attempts,
    games,
    cartellas,
    transactions,
);
