//! SQL schema and reference data for the medbay SQLite store.
//!
//! Both batches run at connection startup. The DDL is idempotent thanks to
//! `CREATE TABLE IF NOT EXISTS`; the seed uses `INSERT OR IGNORE` so edits
//! made to catalog rows after the first start survive restarts.

/// Full schema DDL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Catalog ──────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS lugares (
    id     INTEGER PRIMARY KEY,
    nombre TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS segmentos (
    id     INTEGER PRIMARY KEY,
    nombre TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS zonas (
    id          INTEGER PRIMARY KEY,
    nombre      TEXT NOT NULL,
    segmento_id INTEGER NOT NULL REFERENCES segmentos(id)
);

CREATE TABLE IF NOT EXISTS estructuras (
    id      INTEGER PRIMARY KEY,
    nombre  TEXT NOT NULL,
    zona_id INTEGER NOT NULL REFERENCES zonas(id)
);

CREATE TABLE IF NOT EXISTS mecanismos (
    id     INTEGER PRIMARY KEY,
    nombre TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS tipos_lesion (
    id     INTEGER PRIMARY KEY,
    nombre TEXT NOT NULL UNIQUE
);

-- Injury types a mechanism can produce.
CREATE TABLE IF NOT EXISTS mecanismo_tipo_lesion (
    mecanismo_id   INTEGER NOT NULL REFERENCES mecanismos(id),
    tipo_lesion_id INTEGER NOT NULL REFERENCES tipos_lesion(id),
    PRIMARY KEY (mecanismo_id, tipo_lesion_id)
);

CREATE TABLE IF NOT EXISTS tipos_especificos (
    id             INTEGER PRIMARY KEY,
    nombre         TEXT NOT NULL,
    tipo_lesion_id INTEGER NOT NULL REFERENCES tipos_lesion(id)
);

-- (mechanism, type) pairs for which no subtype applies. Every other allowed
-- pair accepts every subtype of its type.
CREATE TABLE IF NOT EXISTS subtipo_no_aplica (
    mecanismo_id   INTEGER NOT NULL REFERENCES mecanismos(id),
    tipo_lesion_id INTEGER NOT NULL REFERENCES tipos_lesion(id),
    PRIMARY KEY (mecanismo_id, tipo_lesion_id)
);

CREATE TABLE IF NOT EXISTS tratamientos (
    id     INTEGER PRIMARY KEY,
    nombre TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS gravedad (
    id       INTEGER PRIMARY KEY,
    nombre   TEXT NOT NULL UNIQUE,
    dias_min INTEGER,
    dias_max INTEGER
);

-- ── Roster ───────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS planteles (
    id     INTEGER PRIMARY KEY,
    nombre TEXT NOT NULL,
    codigo TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS jugadoras (
    id_jugadora TEXT PRIMARY KEY,
    nombre      TEXT NOT NULL,
    apellido    TEXT NOT NULL,
    posicion    TEXT,               -- 'POR' | 'DEF' | 'MC' | 'DEL'
    plantel     TEXT,               -- planteles.codigo
    activo      INTEGER NOT NULL DEFAULT 1
);

-- ── Injuries ─────────────────────────────────────────────────────────────

-- Catalog values are stored by id and by name so rows stay readable when
-- the catalog changes. Dates are ISO 'YYYY-MM-DD'; timestamps RFC 3339.
CREATE TABLE IF NOT EXISTS lesiones (
    id_lesion                  TEXT PRIMARY KEY,
    id_jugadora                TEXT NOT NULL,
    posicion                   TEXT,
    fecha_lesion               TEXT NOT NULL,
    lugar_id                   INTEGER,
    lugar                      TEXT,
    segmento_id                INTEGER,
    segmento                   TEXT NOT NULL,
    zona_cuerpo_id             INTEGER,
    zona_cuerpo                TEXT NOT NULL,
    zona_especifica_id         INTEGER,
    zona_especifica            TEXT,
    lateralidad                TEXT,
    tipo_lesion_id             INTEGER,
    tipo_lesion                TEXT NOT NULL,
    tipo_especifico_id         INTEGER,
    tipo_especifico            TEXT,
    es_recidiva                INTEGER NOT NULL DEFAULT 0,
    tipo_recidiva              TEXT,
    dias_baja_estimado         INTEGER,
    impacto_dias_baja_estimado TEXT,
    mecanismo_id               INTEGER,
    mecanismo                  TEXT NOT NULL,
    tipo_tratamiento           TEXT NOT NULL DEFAULT '[]',   -- JSON array
    personal_reporta           TEXT NOT NULL,
    fecha_alta_diagnostico     TEXT,
    fecha_alta_medica          TEXT,
    fecha_alta_deportiva       TEXT,
    fecha_observacion_activa   TEXT,
    fecha_observacion_inactiva TEXT,
    estado_lesion              TEXT NOT NULL,
    diagnostico                TEXT,
    descripcion                TEXT,
    evolucion                  TEXT NOT NULL DEFAULT '[]',   -- JSON array
    fecha_hora_registro        TEXT NOT NULL,
    usuario                    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS lesiones_jugadora_idx ON lesiones(id_jugadora);
CREATE INDEX IF NOT EXISTS lesiones_fecha_idx    ON lesiones(fecha_lesion);

PRAGMA user_version = 1;
";

/// Reference catalog rows.
pub const SEED: &str = "
INSERT OR IGNORE INTO lugares (id, nombre) VALUES
    (1, 'ENTRENAMIENTO'),
    (2, 'PARTIDO'),
    (3, 'GIMNASIO'),
    (4, 'OTRO');

INSERT OR IGNORE INTO segmentos (id, nombre) VALUES
    (1, 'TREN SUPERIOR'),
    (2, 'TRONCO / MEDIO'),
    (3, 'TREN INFERIOR');

INSERT OR IGNORE INTO zonas (id, nombre, segmento_id) VALUES
    (1, 'HOMBRO', 1),
    (2, 'BRAZO', 1),
    (3, 'CODO', 1),
    (4, 'ANTEBRAZO', 1),
    (5, 'MUÑECA', 1),
    (6, 'MANO', 1),
    (7, 'CABEZA', 1),
    (8, 'CUELLO', 1),
    (9, 'CADERA', 2),
    (10, 'PELVIS', 2),
    (11, 'COLUMNA LUMBAR', 2),
    (12, 'MUSLO', 3),
    (13, 'PIERNA', 3),
    (14, 'RODILLA', 3),
    (15, 'TOBILLO', 3),
    (16, 'PIE', 3);

INSERT OR IGNORE INTO estructuras (id, nombre, zona_id) VALUES
    (1, 'ISQUIOTIBIALES', 12),
    (2, 'CUÁDRICEPS', 12),
    (3, 'ADUCTORES', 12),
    (4, 'GEMELOS', 13),
    (5, 'SÓLEO', 13),
    (6, 'TIBIAL ANTERIOR', 13),
    (7, 'LCA', 14),
    (8, 'LCP', 14),
    (9, 'MENISCO INTERNO', 14),
    (10, 'MENISCO EXTERNO', 14),
    (11, 'RÓTULA', 14),
    (12, 'LIGAMENTOS LATERALES', 15),
    (13, 'PERONEOS', 15),
    (14, 'TIBIAL POSTERIOR', 15),
    (15, 'ASTRÁGALO', 15),
    (16, 'FASCIA PLANTAR', 16),
    (17, 'METATARSIANOS', 16),
    (18, 'FALANGES', 16),
    (19, 'PSOAS', 9),
    (20, 'GLÚTEO MEDIO', 9),
    (21, 'ROTADORES INTERNOS', 9),
    (22, 'PUBIS', 10),
    (23, 'SINFISIS PÚBICA', 10),
    (24, 'ISQUIOS PROXIMALES', 10),
    (25, 'PARAVERTEBRALES', 11),
    (26, 'DISCOS INTERVERTEBRALES', 11),
    (27, 'L5-S1', 11),
    (28, 'DELTOIDES', 1),
    (29, 'MANGUITO ROTADOR', 1),
    (30, 'CLAVÍCULA', 1),
    (31, 'ACROMIOCLAVICULAR', 1),
    (32, 'BÍCEPS', 2),
    (33, 'TRÍCEPS', 2),
    (34, 'EPICÓNDILO', 3),
    (35, 'EPITRÓCLEA', 3),
    (36, 'OLECRANON', 3),
    (37, 'FLEXORES', 4),
    (38, 'EXTENSORES', 4),
    (39, 'PRONADORES', 4),
    (40, 'ESCAFOIDES', 5),
    (41, 'RADIO DISTAL', 5),
    (42, 'LIGAMENTOS CARPIANOS', 5),
    (43, 'METACARPIANOS', 6),
    (44, 'FALANGES', 6),
    (45, 'PULGAR', 6),
    (46, 'CRÁNEO', 7),
    (47, 'CARA', 7),
    (48, 'MANDÍBULA', 7),
    (49, 'CERVICALES', 8),
    (50, 'TRAPECIO SUPERIOR', 8);

INSERT OR IGNORE INTO mecanismos (id, nombre) VALUES
    (1, 'SIN CONTACTO'),
    (2, 'CON CONTACTO'),
    (3, 'SOBRECARGA'),
    (4, 'MICROTRAUMA REPETITIVO'),
    (5, 'TORSIÓN O DESEQUILIBRIO'),
    (6, 'GOLPE DIRECTO'),
    (7, 'OTRO'),
    (8, 'DESCONOCIDO');

INSERT OR IGNORE INTO tipos_lesion (id, nombre) VALUES
    (1, 'MUSCULAR'),
    (2, 'TENDINOSA'),
    (3, 'LIGAMENTARIA'),
    (4, 'ARTICULAR'),
    (5, 'ÓSEA'),
    (6, 'TRAUMÁTICA / SUPERFICIAL'),
    (7, 'OTRAS');

INSERT OR IGNORE INTO mecanismo_tipo_lesion (mecanismo_id, tipo_lesion_id) VALUES
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (2, 1),
    (2, 3),
    (2, 4),
    (2, 5),
    (2, 6),
    (3, 1),
    (3, 2),
    (4, 2),
    (4, 5),
    (5, 3),
    (5, 4),
    (6, 1),
    (6, 5),
    (6, 6),
    (7, 7),
    (8, 7);

INSERT OR IGNORE INTO tipos_especificos (id, nombre, tipo_lesion_id) VALUES
    (1, 'DISTENSIÓN', 1),
    (2, 'ROTURA FIBRILAR', 1),
    (3, 'CONTUSIÓN MUSCULAR', 1),
    (4, 'TENDINOPATÍA', 2),
    (5, 'ROTURA TENDINOSA', 2),
    (6, 'ESGUINCE', 3),
    (7, 'LESIÓN LIGAMENTARIA', 3),
    (8, 'LUXACIÓN / SUBLUXACIÓN', 4),
    (9, 'LESIÓN ARTICULAR', 4),
    (10, 'FRACTURA', 5),
    (11, 'LACERACIÓN', 6),
    (12, 'CONTUSIÓN SUPERFICIAL', 6),
    (13, 'OTRA', 7);

INSERT OR IGNORE INTO subtipo_no_aplica (mecanismo_id, tipo_lesion_id) VALUES
    (3, 1),
    (3, 2),
    (4, 2),
    (4, 5),
    (7, 7),
    (8, 7);

INSERT OR IGNORE INTO tratamientos (id, nombre) VALUES
    (1, 'CRIOTERAPIA'),
    (2, 'TERMOTERAPIA'),
    (3, 'ELECTROTERAPIA'),
    (4, 'MASOTERAPIA / DRENAJE'),
    (5, 'PUNCIÓN SECA'),
    (6, 'EJERCICIOS DE MOVILIDAD'),
    (7, 'EJERCICIOS DE FUERZA'),
    (8, 'TRABAJO PROPIOCEPTIVO'),
    (9, 'TRABAJO DE CAMPO'),
    (10, 'REEDUCACIÓN TÉCNICA / RETORNO PROGRESIVO');

INSERT OR IGNORE INTO gravedad (id, nombre, dias_min, dias_max) VALUES
    (1, 'LEVE', 1, 3),
    (2, 'MODERADA', 4, 7),
    (3, 'GRAVE', 8, 28),
    (4, 'MUY GRAVE', 29, NULL);
";
