table! {
    recipe (id) {
        id -> Integer,
        name -> Text,
        description -> Text,
    }
}

table! {
    ingredient (id) {
        id -> Integer,
        name -> Text,
        recipe_id -> Integer,
    }
}

joinable!(ingredient -> recipe (recipe_id));

allow_tables_to_appear_in_same_query!(ingredient, recipe);
