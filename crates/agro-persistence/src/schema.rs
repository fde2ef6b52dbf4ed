// Diesel schema shared by the SQLite and Postgres migrations.
// Tablas: users, crops (+ irrigations, soil_analyses, productions),
// field_activities, field_treatments, field_documents
diesel::table! {
    users (id) {
        id -> Integer,
        name -> Text,
        email -> Text,
        password_hash -> Text,
        role -> Text,
        created_at -> Timestamp,
    }
}
diesel::table! {
    crops (id) {
        id -> Integer,
        user_id -> Integer,
        name -> Text,
        variety -> Nullable<Text>,
        plot -> Nullable<Text>,
        area_ha -> Double,
        sowing_date -> Date,
        expected_harvest_date -> Nullable<Date>,
        status -> Text,
    }
}
diesel::table! {
    irrigations (id) {
        id -> Integer,
        crop_id -> Integer,
        date -> Date,
        water_m3 -> Double,
        method -> Nullable<Text>,
        duration_min -> Nullable<Integer>,
        notes -> Nullable<Text>,
    }
}
diesel::table! {
    soil_analyses (id) {
        id -> Integer,
        crop_id -> Integer,
        date -> Date,
        ph -> Double,
        organic_matter_pct -> Nullable<Double>,
        nitrogen_ppm -> Nullable<Double>,
        phosphorus_ppm -> Nullable<Double>,
        potassium_ppm -> Nullable<Double>,
        notes -> Nullable<Text>,
    }
}
diesel::table! {
    productions (id) {
        id -> Integer,
        crop_id -> Integer,
        harvest_date -> Date,
        quantity_kg -> Double,
        quality -> Nullable<Text>,
        price_per_kg -> Nullable<Double>,
        notes -> Nullable<Text>,
    }
}
diesel::table! {
    field_activities (id) {
        id -> Integer,
        user_id -> Integer,
        date -> Date,
        activity_type -> Text,
        description -> Nullable<Text>,
        plot -> Nullable<Text>,
    }
}
diesel::table! {
    field_treatments (id) {
        id -> Integer,
        user_id -> Integer,
        activity_id -> Nullable<Integer>,
        date -> Date,
        product -> Text,
        active_ingredient -> Nullable<Text>,
        dose -> Double,
        dose_unit -> Text,
        target_pest -> Nullable<Text>,
        safety_period_days -> Nullable<Integer>,
        plot -> Nullable<Text>,
    }
}
diesel::table! {
    field_documents (id) {
        id -> Integer,
        user_id -> Integer,
        activity_id -> Nullable<Integer>,
        treatment_id -> Nullable<Integer>,
        title -> Text,
        doc_type -> Nullable<Text>,
        file_path -> Nullable<Text>,
        sha256 -> Nullable<Text>,
        uploaded_at -> Timestamp,
    }
}

diesel::joinable!(crops -> users (user_id));
diesel::joinable!(irrigations -> crops (crop_id));
diesel::joinable!(soil_analyses -> crops (crop_id));
diesel::joinable!(productions -> crops (crop_id));
diesel::joinable!(field_activities -> users (user_id));
diesel::joinable!(field_treatments -> users (user_id));
diesel::joinable!(field_treatments -> field_activities (activity_id));
diesel::joinable!(field_documents -> users (user_id));
diesel::joinable!(field_documents -> field_activities (activity_id));
diesel::joinable!(field_documents -> field_treatments (treatment_id));

diesel::allow_tables_to_appear_in_same_query!(users,
                                              crops,
                                              irrigations,
                                              soil_analyses,
                                              productions,
                                              field_activities,
                                              field_treatments,
                                              field_documents);
