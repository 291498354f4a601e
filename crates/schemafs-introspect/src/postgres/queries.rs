//! Catalog queries. Every selected column is cast to `text` so rows decode
//! uniformly through [`schemafs_core::Executor::query_rows`].

use crate::options::CaptureOptions;

pub const DATABASE_NAME: &str = "select current_database()::text as \"name\"";

pub fn extensions(opts: &CaptureOptions) -> String {
    format!(
        r#"
        select e.extname::text as "name"
        from pg_catalog.pg_extension e
        where true{skip}
        order by 1
        "#,
        skip = not_in("e.extname", &opts.skip_extensions),
    )
}

pub fn types(opts: &CaptureOptions) -> String {
    format!(
        r#"
        select
          n.nspname::text as "schema",
          t.typname::text as "name",
          json_agg(e.enumlabel order by e.enumsortorder)::text as "labels"
        from pg_catalog.pg_type t
        join pg_catalog.pg_enum e on e.enumtypid = t.oid
        join pg_catalog.pg_namespace n on n.oid = t.typnamespace
        where true{skip}
        group by 1, 2
        order by 1, 2
        "#,
        skip = not_in("n.nspname", &opts.skip_schemas),
    )
}

pub fn sequences(opts: &CaptureOptions) -> String {
    format!(
        r#"
        select
          s.sequence_schema::text as "schema",
          s.sequence_name::text as "name",
          s.increment::text as "increment",
          s.minimum_value::text as "minimum_value",
          s.maximum_value::text as "maximum_value"
        from information_schema.sequences s
        where true{skip}
        order by 1, 2
        "#,
        skip = not_in("s.sequence_schema", &opts.skip_schemas),
    )
}

/// Ordinary tables with their attributes aggregated as a JSON array.
///
/// Defaults are cut to 128 characters. Only single-column foreign keys
/// are reported as references.
pub fn tables(opts: &CaptureOptions) -> String {
    format!(
        r#"
        select
          n.nspname::text as "schema",
          c.relname::text as "table",
          (
            select jsonb_agg(t.attribute order by t.attnum)
            from (
              select
                a.attnum,
                jsonb_build_object(
                  'name', a.attname,
                  'type', pg_catalog.format_type(a.atttypid, a.atttypmod),
                  'defaultValue', (
                    select substring(pg_catalog.pg_get_expr(d.adbin, d.adrelid) for 128)
                    from pg_catalog.pg_attrdef d
                    where d.adrelid = a.attrelid
                      and d.adnum = a.attnum
                      and a.atthasdef
                  ),
                  'isNotNull', a.attnotnull,
                  'isPrimaryKey', exists (
                    select 1
                    from pg_catalog.pg_constraint pk
                    where pk.conrelid = c.oid
                      and pk.conkey = array[a.attnum]
                      and pk.contype = 'p'
                  ),
                  'description', pg_catalog.col_description(a.attrelid, a.attnum),
                  'references', (
                    select jsonb_build_object(
                      'table', r.confrelid::regclass::text,
                      'attribute', (
                        select jsonb_build_object(
                          'name', a2.attname,
                          'isPrimaryKey', exists (
                            select 1
                            from pg_catalog.pg_constraint pk2
                            where pk2.conrelid = a2.attrelid
                              and pk2.conkey = array[a2.attnum]
                              and pk2.contype = 'p'
                          )
                        )
                        from pg_catalog.pg_attribute a2
                        where a2.attnum = r.confkey[1]
                          and a2.attrelid = r.confrelid
                      )
                    )
                    from pg_catalog.pg_constraint r
                    where r.conrelid = c.oid
                      and r.conkey = array[a.attnum]
                      and array_length(r.confkey, 1) = 1
                      and r.contype = 'f'
                    limit 1
                  )
                ) as attribute
              from pg_catalog.pg_attribute a
              where a.attrelid = c.oid
                and a.attnum > 0
                and not a.attisdropped
            ) t
          )::text as "attributes"
        from pg_catalog.pg_class c
        left join pg_catalog.pg_namespace n on n.oid = c.relnamespace
        where c.relkind = 'r'{skip}
        order by 1, 2
        "#,
        skip = not_in("n.nspname", &opts.skip_schemas),
    )
}

/// Plain functions and procedures defined in SQL or a procedural language.
pub fn functions(opts: &CaptureOptions) -> String {
    format!(
        r#"
        select
          n.nspname::text as "schema",
          p.proname::text as "name",
          pg_catalog.pg_get_functiondef(p.oid)::text as "src"
        from pg_catalog.pg_proc p
        join pg_catalog.pg_namespace n on n.oid = p.pronamespace
        where p.prokind in ('f', 'p')
          and p.probin is null{skip_functions}{skip_schemas}
        order by 1, 2
        "#,
        skip_functions = not_in("p.proname", &opts.skip_functions),
        skip_schemas = not_in("n.nspname", &opts.skip_schemas),
    )
}

pub fn indexes(opts: &CaptureOptions) -> String {
    format!(
        r#"
        select
          i.schemaname::text as "schema",
          i.tablename::text as "table",
          i.indexname::text as "name",
          (i.indexdef || E'\n')::text as "src"
        from pg_catalog.pg_indexes i
        where true{skip}
        order by 1, 2, 3
        "#,
        skip = not_in("i.schemaname", &opts.skip_schemas),
    )
}

pub fn views(opts: &CaptureOptions) -> String {
    format!(
        r#"
        select
          v.schemaname::text as "schema",
          v.viewname::text as "name",
          v.definition::text as "src"
        from pg_catalog.pg_views v
        where true{skip}
        order by 1, 2
        "#,
        skip = not_in("v.schemaname", &opts.skip_schemas),
    )
}

/// Enabled, user-defined triggers.
pub fn triggers(opts: &CaptureOptions) -> String {
    format!(
        r#"
        select
          n.nspname::text as "schema",
          t.tgrelid::regclass::text as "table",
          t.tgname::text as "name",
          pg_catalog.pg_get_triggerdef(t.oid)::text as "src"
        from pg_catalog.pg_trigger t
        join pg_catalog.pg_class c on c.oid = t.tgrelid
        join pg_catalog.pg_namespace n on n.oid = c.relnamespace
        where not t.tgisinternal
          and t.tgenabled = 'O'{skip}
        order by 1, 2, 3
        "#,
        skip = not_in("n.nspname", &opts.skip_schemas),
    )
}

pub fn database_exists(name: &str) -> String {
    format!(
        "select exists (select 1 from pg_catalog.pg_database where datname = {})::text as \"exists\"",
        quote_literal(name)
    )
}

pub fn create_database(name: &str) -> String {
    format!("CREATE DATABASE {}", quote_ident(name))
}

pub fn drop_database(name: &str) -> String {
    format!("DROP DATABASE {}", quote_ident(name))
}

/// `'value'` with embedded quotes doubled.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `"value"` with embedded quotes doubled.
pub fn quote_ident(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn not_in(column: &str, values: &[String]) -> String {
    if values.is_empty() {
        return String::new();
    }
    let list = values
        .iter()
        .map(|value| quote_literal(value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("\n          and {column} not in ({list})")
}
