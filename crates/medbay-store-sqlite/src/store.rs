//! [`SqliteStore`]: the SQLite implementation of [`InjuryStore`].

use std::path::Path;

use medbay_core::{
  catalog::{
    Catalog, CatalogEntry, MechanismType, SeverityRange, Structure, Subtype, SubtypeCompatibility,
    Zone,
  },
  injury::InjuryRecord,
  roster::{Player, Position, Squad},
  store::{InjuryQuery, InjuryStore},
};
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};

use crate::{
  Error, Result,
  encode::{
    INJURY_COLUMN_COUNT, INJURY_COLUMNS, PLAYER_COLUMNS, RawPlayer, decode_injury, encode_date,
    injury_values, lifecycle_values, read_injury_row, read_squad,
  },
  schema::{SCHEMA, SEED},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An injury register backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, run schema initialisation and seed
  /// the catalog.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch(SEED)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run an injury SELECT and decode every row.
  async fn query_injuries(&self, sql: String, params: Vec<SqlValue>) -> Result<Vec<InjuryRecord>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), read_injury_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows.into_iter().map(decode_injury).collect()
  }
}

fn entries(conn: &rusqlite::Connection, table: &str) -> rusqlite::Result<Vec<CatalogEntry>> {
  let mut stmt = conn.prepare(&format!("SELECT id, nombre FROM {table} ORDER BY id"))?;
  let rows = stmt
    .query_map([], |row| Ok(CatalogEntry { id: row.get(0)?, name: row.get(1)? }))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn read_catalog(conn: &rusqlite::Connection) -> rusqlite::Result<Catalog> {
  let zones: Vec<Zone> = conn
    .prepare("SELECT id, nombre, segmento_id FROM zonas ORDER BY id")?
    .query_map([], |row| Ok(Zone { id: row.get(0)?, name: row.get(1)?, segment_id: row.get(2)? }))?
    .collect::<rusqlite::Result<_>>()?;

  let structures: Vec<Structure> = conn
    .prepare("SELECT id, nombre, zona_id FROM estructuras ORDER BY id")?
    .query_map([], |row| Ok(Structure { id: row.get(0)?, name: row.get(1)?, zone_id: row.get(2)? }))?
    .collect::<rusqlite::Result<_>>()?;

  let mechanism_types: Vec<MechanismType> = conn
    .prepare(
      "SELECT mecanismo_id, tipo_lesion_id FROM mecanismo_tipo_lesion
       ORDER BY mecanismo_id, tipo_lesion_id",
    )?
    .query_map([], |row| Ok(MechanismType { mechanism_id: row.get(0)?, injury_type_id: row.get(1)? }))?
    .collect::<rusqlite::Result<_>>()?;

  let subtypes: Vec<Subtype> = conn
    .prepare("SELECT id, nombre, tipo_lesion_id FROM tipos_especificos ORDER BY id")?
    .query_map([], |row| {
      Ok(Subtype { id: row.get(0)?, name: row.get(1)?, injury_type_id: row.get(2)? })
    })?
    .collect::<rusqlite::Result<_>>()?;

  // Every subtype of an allowed (mechanism, type) pair, minus the pairs
  // flagged as having no applicable subtype.
  let subtype_compatibility: Vec<SubtypeCompatibility> = conn
    .prepare(
      "SELECT mt.mecanismo_id, mt.tipo_lesion_id, te.id
       FROM mecanismo_tipo_lesion mt
       JOIN tipos_especificos te ON te.tipo_lesion_id = mt.tipo_lesion_id
       WHERE NOT EXISTS (
         SELECT 1 FROM subtipo_no_aplica x
         WHERE x.mecanismo_id = mt.mecanismo_id AND x.tipo_lesion_id = mt.tipo_lesion_id
       )
       ORDER BY mt.mecanismo_id, mt.tipo_lesion_id, te.id",
    )?
    .query_map([], |row| {
      Ok(SubtypeCompatibility {
        mechanism_id:   row.get(0)?,
        injury_type_id: row.get(1)?,
        subtype_id:     row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<_>>()?;

  let severity_ranges: Vec<SeverityRange> = conn
    .prepare("SELECT nombre, dias_min, dias_max FROM gravedad ORDER BY dias_min")?
    .query_map([], |row| {
      Ok(SeverityRange { label: row.get(0)?, min_days: row.get(1)?, max_days: row.get(2)? })
    })?
    .collect::<rusqlite::Result<_>>()?;

  Ok(Catalog {
    places: entries(conn, "lugares")?,
    segments: entries(conn, "segmentos")?,
    zones,
    structures,
    mechanisms: entries(conn, "mecanismos")?,
    injury_types: entries(conn, "tipos_lesion")?,
    mechanism_types,
    subtypes,
    subtype_compatibility,
    treatments: entries(conn, "tratamientos")?,
    severity_ranges,
  })
}

// ─── InjuryStore impl ────────────────────────────────────────────────────────

impl InjuryStore for SqliteStore {
  type Error = Error;

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn catalog(&self) -> Result<Catalog> {
    Ok(self.conn.call(|conn| Ok(read_catalog(conn)?)).await?)
  }

  // ── Roster ────────────────────────────────────────────────────────────────

  async fn list_squads(&self) -> Result<Vec<Squad>> {
    let squads = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT id, nombre, codigo FROM planteles ORDER BY nombre")?;
        let rows = stmt.query_map([], read_squad)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(squads)
  }

  async fn upsert_squad(&self, squad: Squad) -> Result<Squad> {
    let (name, code) = (squad.name.clone(), squad.code.clone());
    let stored = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO planteles (nombre, codigo) VALUES (?1, ?2)
           ON CONFLICT (codigo) DO UPDATE SET nombre = excluded.nombre",
          rusqlite::params![name, code],
        )?;
        Ok(conn.query_row(
          "SELECT id, nombre, codigo FROM planteles WHERE codigo = ?1",
          rusqlite::params![code],
          read_squad,
        )?)
      })
      .await?;
    tracing::debug!(code = %stored.code, "squad stored");
    Ok(stored)
  }

  async fn list_players(
    &self,
    squad: Option<String>,
    position: Option<Position>,
  ) -> Result<Vec<Player>> {
    let position = position.map(|p| p.to_string());

    let raws: Vec<RawPlayer> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {PLAYER_COLUMNS} FROM jugadoras
           WHERE (?1 IS NULL OR plantel = ?1)
             AND (?2 IS NULL OR posicion = ?2)
           ORDER BY apellido, nombre"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![squad, position], RawPlayer::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawPlayer::into_player).collect())
  }

  async fn get_player(&self, player_id: String) -> Result<Option<Player>> {
    let raw: Option<RawPlayer> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PLAYER_COLUMNS} FROM jugadoras WHERE id_jugadora = ?1"),
            rusqlite::params![player_id],
            RawPlayer::read,
          )
          .optional()?)
      })
      .await?;

    Ok(raw.map(RawPlayer::into_player))
  }

  async fn upsert_player(&self, player: Player) -> Result<Player> {
    let p = player.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO jugadoras (id_jugadora, nombre, apellido, posicion, plantel, activo)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (id_jugadora) DO UPDATE SET
             nombre = excluded.nombre,
             apellido = excluded.apellido,
             posicion = excluded.posicion,
             plantel = excluded.plantel,
             activo = excluded.activo",
          rusqlite::params![
            p.player_id,
            p.first_name,
            p.last_name,
            p.position.map(|pos| pos.to_string()),
            p.squad,
            p.active,
          ],
        )?;
        Ok(())
      })
      .await?;
    tracing::debug!(player = %player.player_id, "player stored");
    Ok(player)
  }

  // ── Injuries: reads ───────────────────────────────────────────────────────

  async fn list_injuries(&self, query: &InjuryQuery) -> Result<Vec<InjuryRecord>> {
    let mut conds: Vec<&'static str> = vec![];
    let mut params: Vec<SqlValue> = vec![];

    if let Some(player_id) = &query.player_id {
      conds.push("id_jugadora = ?");
      params.push(SqlValue::Text(player_id.clone()));
    }
    if let Some(squad) = &query.squad {
      conds.push("id_jugadora IN (SELECT id_jugadora FROM jugadoras WHERE plantel = ?)");
      params.push(SqlValue::Text(squad.clone()));
    }
    if let Some(position) = query.position {
      conds.push("posicion = ?");
      params.push(SqlValue::Text(position.to_string()));
    }
    if let Some(injury_type) = &query.injury_type {
      conds.push("UPPER(TRIM(tipo_lesion)) = UPPER(TRIM(?))");
      params.push(SqlValue::Text(injury_type.clone()));
    }
    if let Some(status) = query.status {
      conds.push("estado_lesion = ?");
      params.push(SqlValue::Text(status.to_string()));
    }
    if let Some(from) = query.from {
      conds.push("fecha_lesion >= ?");
      params.push(SqlValue::Text(encode_date(from)));
    }
    if let Some(to) = query.to {
      conds.push("fecha_lesion <= ?");
      params.push(SqlValue::Text(encode_date(to)));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    params.push(SqlValue::Integer(query.limit.map_or(-1, |l| l as i64)));
    params.push(SqlValue::Integer(query.offset.unwrap_or(0) as i64));

    let sql = format!(
      "SELECT {INJURY_COLUMNS} FROM lesiones
       {where_clause}
       ORDER BY fecha_lesion DESC, fecha_hora_registro DESC
       LIMIT ? OFFSET ?"
    );
    self.query_injuries(sql, params).await
  }

  async fn get_injury(&self, injury_id: String) -> Result<Option<InjuryRecord>> {
    let sql = format!("SELECT {INJURY_COLUMNS} FROM lesiones WHERE id_lesion = ?");
    Ok(self.query_injuries(sql, vec![SqlValue::Text(injury_id)]).await?.into_iter().next())
  }

  async fn injuries_for_player(&self, player_id: String) -> Result<Vec<InjuryRecord>> {
    let sql = format!(
      "SELECT {INJURY_COLUMNS} FROM lesiones WHERE id_jugadora = ?
       ORDER BY fecha_hora_registro DESC, rowid DESC"
    );
    self.query_injuries(sql, vec![SqlValue::Text(player_id)]).await
  }

  async fn last_injury_id(&self, player_id: String) -> Result<Option<String>> {
    let id = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id_lesion FROM lesiones WHERE id_jugadora = ?1
             ORDER BY fecha_hora_registro DESC, rowid DESC LIMIT 1",
            rusqlite::params![player_id],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;
    Ok(id)
  }

  // ── Injuries: writes ──────────────────────────────────────────────────────

  async fn insert_injury(&self, record: InjuryRecord) -> Result<InjuryRecord> {
    let injury_id = record.injury_id.clone();
    let values = injury_values(record.clone())?;
    let placeholders = vec!["?"; INJURY_COLUMN_COUNT].join(", ");
    let sql = format!("INSERT INTO lesiones ({INJURY_COLUMNS}) VALUES ({placeholders})");

    let id = injury_id.clone();
    let inserted = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row("SELECT 1 FROM lesiones WHERE id_lesion = ?1", rusqlite::params![id], |_| {
            Ok(())
          })
          .optional()?
          .is_some();
        if taken {
          return Ok(false);
        }
        conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(medbay_core::Error::DuplicateInjury(injury_id).into());
    }
    tracing::debug!(injury = %injury_id, "injury inserted");
    Ok(record)
  }

  async fn update_lifecycle(&self, record: InjuryRecord) -> Result<InjuryRecord> {
    let injury_id = record.injury_id.clone();
    let values = lifecycle_values(&record)?;

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE lesiones SET
             evolucion = ?1,
             fecha_alta_diagnostico = ?2,
             fecha_alta_medica = ?3,
             fecha_alta_deportiva = ?4,
             fecha_observacion_activa = ?5,
             fecha_observacion_inactiva = ?6,
             estado_lesion = ?7,
             dias_baja_estimado = ?8,
             impacto_dias_baja_estimado = ?9
           WHERE id_lesion = ?10",
          rusqlite::params_from_iter(values),
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(medbay_core::Error::InjuryNotFound(injury_id).into());
    }
    tracing::debug!(injury = %injury_id, sessions = record.session_count(), "injury lifecycle updated");
    Ok(record)
  }
}
