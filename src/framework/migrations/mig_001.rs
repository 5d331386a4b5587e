//! Migration 1
//!
//! Track several chains: adds a chain discriminator to snapshots and their
//! metrics, makes snapshots unique per chain and adds cross-chain supply.

use super::Step;

pub(super) const STEPS: &[Step] = &[
    Step {
        description: "add chain to snapshots",
        sql: "
            alter table whales.snapshots
            add column if not exists chain text not null default 'mainchain';",
    },
    Step {
        description: "add chain to concentration metrics",
        sql: "
            alter table whales.concentration_metrics
            add column if not exists chain text not null default 'mainchain';",
    },
    Step {
        description: "drop chain-less snapshot uniqueness",
        sql: "
            alter table whales.snapshots
            drop constraint if exists snapshots_date_time_slot_key;",
    },
    Step {
        description: "make snapshots unique per chain",
        sql: "
            create unique index if not exists snapshots_date_time_slot_chain_key
            on whales.snapshots (date, time_slot, chain);",
    },
    Step {
        description: "index metrics by chain",
        sql: "
            create index if not exists concentration_metrics_chain_date_idx
            on whales.concentration_metrics (chain, date, time_slot);",
    },
    Step {
        description: "create cross-chain supply table",
        sql: "
            create table if not exists whales.cross_chain_supply (
                id bigserial primary key,
                date date not null,
                time_slot text not null,
                -- total of main chain top 100
                mainchain_top100 numeric,
                -- ELA locked in the main chain side of the ESC bridge
                bridge_balance numeric,
                esc_total_supply numeric,
                esc_top100 numeric,
                -- ELA bridged to Ethereum
                eth_bridged_supply numeric,
                fetched_at timestamptz not null,
                constraint cross_chain_supply_date_time_slot_key unique (date, time_slot)
            );",
    },
];
