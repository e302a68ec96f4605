use diesel::sql_types::Double;

no_arg_sql_function!(random, Double, "The SQL RANDOM() function");
