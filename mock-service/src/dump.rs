//! Synthetic `pg_dump` output.

use chrono::{DateTime, Utc};
use common::models::{Database, DumpOptions};

/// Renders a plain-format SQL dump for `database`.
///
/// `scope` names where the database lives (`container pg1`, `host`).
pub fn render(
    server_id: &str,
    scope: &str,
    database: &Database,
    options: DumpOptions,
    at: DateTime<Utc>,
) -> String {
    let flag = if options.is_data_only() {
        "-- Options: --data-only\n"
    } else if options.is_schema_only() {
        "-- Options: --schema-only\n"
    } else {
        ""
    };

    let mut sql = format!(
        "--\n-- PostgreSQL database dump\n--\n\
         -- Database: {name}\n\
         -- Server: {server_id} ({scope})\n\
         -- Dumped at: {at}\n\
         {flag}\n\
         SET statement_timeout = 0;\n\
         SET client_encoding = '{encoding}';\n\
         SET standard_conforming_strings = on;\n\n",
        name = database.name,
        at = at.to_rfc3339(),
        encoding = database.encoding,
    );

    if !options.is_data_only() {
        sql.push_str(&format!(
            "CREATE TABLE public.items (\n\
             \x20   id integer NOT NULL,\n\
             \x20   name text NOT NULL,\n\
             \x20   created_at timestamp with time zone DEFAULT now()\n\
             );\n\n\
             ALTER TABLE public.items OWNER TO {};\n\n",
            database.owner
        ));
    }

    if !options.is_schema_only() {
        sql.push_str(
            "COPY public.items (id, name, created_at) FROM stdin;\n\
             1\talpha\t2024-01-01 00:00:00+00\n\
             2\tbeta\t2024-01-02 00:00:00+00\n\
             \\.\n\n",
        );
    }

    sql.push_str("--\n-- PostgreSQL database dump complete\n--\n");
    sql
}
