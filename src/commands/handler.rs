//! Command execution.
//!
//! A stateless dispatcher: [`execute`] receives a parsed request frame
//! (an array of bulk strings) and a mutable borrow of the stores,
//! validates arity, parses typed arguments, mutates the store the
//! command belongs to, and produces the reply. Dispatch is by uppercased
//! command name; each data-type family consults its own registry. Error
//! strings follow the usual taxonomy:
//!
//! - arity: `ERR wrong number of arguments for '<cmd>' command`
//! - integer parse: `ERR value is not an integer or out of range`
//! - unknown command: `CMD NOT FOUND`
//! - domain errors: `ERR …` at the handler's discretion

use crate::ds::{BloomFilter, BPlusTree, CountMinSketch, SimpleSet};
use crate::protocol::RespValue;
use crate::storage::dict::now_ms;
use crate::storage::Stores;

/// Executes one request frame against the stores and returns the reply.
pub fn execute(stores: &mut Stores, frame: RespValue) -> RespValue {
    let args = match frame {
        RespValue::Array(args) => args,
        _ => return RespValue::error("ERR invalid command format"),
    };
    if args.is_empty() {
        return RespValue::error("ERR empty command");
    }

    let name = match args[0].as_str() {
        Some(s) => s.to_uppercase(),
        None => return RespValue::error("ERR invalid command name"),
    };

    dispatch(stores, &name, &args[1..])
}

fn dispatch(stores: &mut Stores, cmd: &str, args: &[RespValue]) -> RespValue {
    match cmd {
        "PING" => cmd_ping(args),
        "SET" => cmd_set(stores, args),
        "GET" => cmd_get(stores, args),
        "TTL" => cmd_ttl(stores, args),
        "EXPIRE" => cmd_expire(stores, args),
        "DEL" => cmd_del(stores, args),
        "EXISTS" => cmd_exists(stores, args),
        "INFO" => cmd_info(stores, args),

        "ZADD" => cmd_zadd(stores, args),
        "ZSCORE" => cmd_zscore(stores, args),
        "ZRANK" => cmd_zrank(stores, args),

        "SADD" => cmd_sadd(stores, args),
        "SREM" => cmd_srem(stores, args),
        "SMEMBERS" => cmd_smembers(stores, args),
        "SISMEMBER" => cmd_sismember(stores, args),

        "CMS.INITBYDIM" => cmd_cms_initbydim(stores, args),
        "CMS.INITBYPROB" => cmd_cms_initbyprob(stores, args),
        "CMS.INCRBY" => cmd_cms_incrby(stores, args),
        "CMS.QUERY" => cmd_cms_query(stores, args),

        "BF.RESERVE" => cmd_bf_reserve(stores, args),
        "BF.MADD" => cmd_bf_madd(stores, args),
        "BF.EXISTS" => cmd_bf_exists(stores, args),

        _ => RespValue::error("CMD NOT FOUND"),
    }
}

// ----------------------------------------------------------------------
// Argument helpers
// ----------------------------------------------------------------------

fn arg_str(value: &RespValue) -> Option<String> {
    value.as_str().map(|s| s.to_string())
}

fn arg_i64(value: &RespValue) -> Option<i64> {
    value.as_str().and_then(|s| s.parse().ok())
}

fn arg_u64(value: &RespValue) -> Option<u64> {
    value.as_str().and_then(|s| s.parse().ok())
}

fn arg_f64(value: &RespValue) -> Option<f64> {
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|f| !f.is_nan())
}

fn arity_error(cmd: &str) -> RespValue {
    RespValue::error(format!("ERR wrong number of arguments for '{cmd}' command"))
}

fn integer_error() -> RespValue {
    RespValue::error("ERR value is not an integer or out of range")
}

// ----------------------------------------------------------------------
// Keyspace commands
// ----------------------------------------------------------------------

/// PING [message]
fn cmd_ping(args: &[RespValue]) -> RespValue {
    match args {
        [] => RespValue::pong(),
        [msg] => match arg_str(msg) {
            Some(s) => RespValue::bulk_string(s),
            None => RespValue::error("ERR invalid argument"),
        },
        _ => arity_error("ping"),
    }
}

/// SET key value [token seconds]
///
/// With four arguments the fourth is parsed as seconds; the third is
/// reserved and ignored.
fn cmd_set(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() < 2 || args.len() == 3 || args.len() > 4 {
        return arity_error("set");
    }
    let (key, value) = match (arg_str(&args[0]), arg_str(&args[1])) {
        (Some(k), Some(v)) => (k, v),
        _ => return RespValue::error("ERR invalid argument"),
    };

    let mut ttl_ms = -1i64;
    if args.len() == 4 {
        let seconds = match arg_i64(&args[3]) {
            Some(s) => s,
            None => return integer_error(),
        };
        ttl_ms = seconds.saturating_mul(1000);
    }

    stores.dict.set(&key, &value, ttl_ms);
    RespValue::ok()
}

/// GET key
fn cmd_get(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() != 1 {
        return arity_error("get");
    }
    let key = match arg_str(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid argument"),
    };
    match stores.dict.lookup(&key) {
        Some(value) => RespValue::bulk_string(value),
        None => RespValue::null(),
    }
}

/// TTL key → seconds remaining, :-1 without expiry, :-2 when absent.
fn cmd_ttl(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() != 1 {
        return arity_error("ttl");
    }
    let key = match arg_str(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid argument"),
    };

    if stores.dict.lookup(&key).is_none() {
        return RespValue::integer(-2);
    }
    match stores.dict.get_expiry(&key) {
        None => RespValue::integer(-1),
        Some(deadline) => {
            // Rounds up so a fresh `EX 1` reads back as 1, not 0.
            let remain_ms = deadline.saturating_sub(now_ms());
            RespValue::integer(remain_ms.div_ceil(1000) as i64)
        }
    }
}

/// EXPIRE key seconds → :1 if set, :0 when the key is absent.
fn cmd_expire(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() != 2 {
        return arity_error("expire");
    }
    let key = match arg_str(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid argument"),
    };
    let seconds = match arg_i64(&args[1]) {
        Some(s) => s,
        None => return integer_error(),
    };

    if stores.dict.lookup(&key).is_none() {
        return RespValue::integer(0);
    }
    stores.dict.set_expiry(&key, seconds.saturating_mul(1000));
    RespValue::integer(1)
}

/// DEL key [key …] → count of keys that were present.
fn cmd_del(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.is_empty() {
        return arity_error("del");
    }
    let mut deleted = 0i64;
    for arg in args {
        if let Some(key) = arg_str(arg) {
            if stores.dict.del(&key) {
                deleted += 1;
            }
        }
    }
    RespValue::integer(deleted)
}

/// EXISTS key [key …] → count of present, non-expired keys.
fn cmd_exists(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.is_empty() {
        return arity_error("exists");
    }
    let mut present = 0i64;
    for arg in args {
        if let Some(key) = arg_str(arg) {
            if stores.dict.lookup(&key).is_some() {
                present += 1;
            }
        }
    }
    RespValue::integer(present)
}

/// INFO → keyspace statistics.
fn cmd_info(stores: &mut Stores, _args: &[RespValue]) -> RespValue {
    let info = format!(
        "# Keyspace\r\ndb0:keys={},expires={},avg_ttl=0\r\n",
        stores.dict.len(),
        stores.dict.expires_len()
    );
    RespValue::bulk_string(info)
}

// ----------------------------------------------------------------------
// Sorted-set commands
// ----------------------------------------------------------------------

/// ZADD key score member
fn cmd_zadd(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() != 3 {
        return arity_error("zadd");
    }
    let key = match arg_str(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid argument"),
    };
    let score = match arg_f64(&args[1]) {
        Some(s) => s,
        None => return RespValue::error("ERR value is not a valid float"),
    };
    let member = match arg_str(&args[2]) {
        Some(m) => m,
        None => return RespValue::error("ERR invalid argument"),
    };

    let degree = stores.zset_degree;
    let tree = stores
        .zsets
        .entry(key)
        .or_insert_with(|| BPlusTree::new(degree));
    RespValue::integer(tree.add(score, &member))
}

/// ZSCORE key member → bulk score or nil.
fn cmd_zscore(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() != 2 {
        return arity_error("zscore");
    }
    let (key, member) = match (arg_str(&args[0]), arg_str(&args[1])) {
        (Some(k), Some(m)) => (k, m),
        _ => return RespValue::error("ERR invalid argument"),
    };

    match stores.zsets.get(&key).and_then(|tree| tree.score(&member)) {
        Some(score) => RespValue::bulk_string(format_score(score)),
        None => RespValue::null(),
    }
}

/// ZRANK key member → :rank or nil.
fn cmd_zrank(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() != 2 {
        return arity_error("zrank");
    }
    let (key, member) = match (arg_str(&args[0]), arg_str(&args[1])) {
        (Some(k), Some(m)) => (k, m),
        _ => return RespValue::error("ERR invalid argument"),
    };

    match stores.zsets.get(&key).map(|tree| tree.rank(&member)) {
        Some(rank) if rank >= 0 => RespValue::integer(rank),
        _ => RespValue::null(),
    }
}

// ----------------------------------------------------------------------
// Simple-set commands
// ----------------------------------------------------------------------

/// SADD key member [member …] → count of newly added members.
fn cmd_sadd(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() < 2 {
        return arity_error("sadd");
    }
    let key = match arg_str(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid argument"),
    };

    let set = stores.sets.entry(key).or_insert_with(SimpleSet::new);
    let mut added = 0i64;
    for arg in &args[1..] {
        if let Some(member) = arg_str(arg) {
            added += set.add(&member);
        }
    }
    RespValue::integer(added)
}

/// SREM key member [member …] → count of removed members.
fn cmd_srem(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() < 2 {
        return arity_error("srem");
    }
    let key = match arg_str(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid argument"),
    };

    let mut removed = 0i64;
    if let Some(set) = stores.sets.get_mut(&key) {
        for arg in &args[1..] {
            if let Some(member) = arg_str(arg) {
                removed += set.remove(&member);
            }
        }
    }
    RespValue::integer(removed)
}

/// SMEMBERS key → array of members (empty for a missing set).
fn cmd_smembers(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() != 1 {
        return arity_error("smembers");
    }
    let key = match arg_str(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid argument"),
    };

    let members = stores.sets.get(&key).map(|s| s.members()).unwrap_or_default();
    RespValue::array(members.into_iter().map(RespValue::bulk_string).collect())
}

/// SISMEMBER key member → :0 or :1.
fn cmd_sismember(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() != 2 {
        return arity_error("sismember");
    }
    let (key, member) = match (arg_str(&args[0]), arg_str(&args[1])) {
        (Some(k), Some(m)) => (k, m),
        _ => return RespValue::error("ERR invalid argument"),
    };

    let present = stores.sets.get(&key).is_some_and(|s| s.contains(&member));
    RespValue::integer(i64::from(present))
}

// ----------------------------------------------------------------------
// Count-Min Sketch commands
// ----------------------------------------------------------------------

/// CMS.INITBYDIM name width depth
fn cmd_cms_initbydim(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() != 3 {
        return arity_error("cms.initbydim");
    }
    let name = match arg_str(&args[0]) {
        Some(n) => n,
        None => return RespValue::error("ERR invalid argument"),
    };
    let (width, depth) = match (arg_u64(&args[1]), arg_u64(&args[2])) {
        (Some(w), Some(d)) => (w, d),
        _ => return integer_error(),
    };
    if width == 0 || depth == 0 {
        return RespValue::error("ERR invalid dimensions");
    }

    if stores.sketches.contains_key(&name) {
        return RespValue::error("ERR sketch already exists");
    }
    stores
        .sketches
        .insert(name, CountMinSketch::with_dim(width as usize, depth as usize));
    RespValue::ok()
}

/// CMS.INITBYPROB name error probability
fn cmd_cms_initbyprob(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() != 3 {
        return arity_error("cms.initbyprob");
    }
    let name = match arg_str(&args[0]) {
        Some(n) => n,
        None => return RespValue::error("ERR invalid argument"),
    };
    let (epsilon, delta) = match (arg_f64(&args[1]), arg_f64(&args[2])) {
        (Some(e), Some(d)) => (e, d),
        _ => return RespValue::error("ERR invalid probability"),
    };
    if !(0.0 < epsilon && epsilon < 1.0) || !(0.0 < delta && delta < 1.0) {
        return RespValue::error("ERR invalid probability");
    }

    if stores.sketches.contains_key(&name) {
        return RespValue::error("ERR sketch already exists");
    }
    stores
        .sketches
        .insert(name, CountMinSketch::with_prob(epsilon, delta));
    RespValue::ok()
}

/// CMS.INCRBY name item delta [item delta …] → array of estimates.
fn cmd_cms_incrby(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() < 3 || (args.len() - 1) % 2 != 0 {
        return arity_error("cms.incrby");
    }
    let name = match arg_str(&args[0]) {
        Some(n) => n,
        None => return RespValue::error("ERR invalid argument"),
    };

    let sketch = match stores.sketches.get_mut(&name) {
        Some(s) => s,
        None => return RespValue::error("ERR no such sketch"),
    };

    let mut estimates = Vec::with_capacity((args.len() - 1) / 2);
    for pair in args[1..].chunks(2) {
        let item = match arg_str(&pair[0]) {
            Some(i) => i,
            None => return RespValue::error("ERR invalid argument"),
        };
        let delta = match arg_u64(&pair[1]) {
            Some(d) => d,
            None => return integer_error(),
        };
        estimates.push(RespValue::integer(sketch.incr_by(&item, delta) as i64));
    }
    RespValue::array(estimates)
}

/// CMS.QUERY name item [item …] → array of estimates.
fn cmd_cms_query(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() < 2 {
        return arity_error("cms.query");
    }
    let name = match arg_str(&args[0]) {
        Some(n) => n,
        None => return RespValue::error("ERR invalid argument"),
    };

    let sketch = match stores.sketches.get(&name) {
        Some(s) => s,
        None => return RespValue::error("ERR no such sketch"),
    };

    let mut estimates = Vec::with_capacity(args.len() - 1);
    for arg in &args[1..] {
        match arg_str(arg) {
            Some(item) => estimates.push(RespValue::integer(sketch.query(&item) as i64)),
            None => return RespValue::error("ERR invalid argument"),
        }
    }
    RespValue::array(estimates)
}

// ----------------------------------------------------------------------
// Bloom filter commands
// ----------------------------------------------------------------------

/// BF.RESERVE name capacity error_rate
fn cmd_bf_reserve(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() != 3 {
        return arity_error("bf.reserve");
    }
    let name = match arg_str(&args[0]) {
        Some(n) => n,
        None => return RespValue::error("ERR invalid argument"),
    };
    let capacity = match arg_u64(&args[1]) {
        Some(c) if c > 0 => c,
        _ => return integer_error(),
    };
    let error_rate = match arg_f64(&args[2]) {
        Some(p) if 0.0 < p && p < 1.0 => p,
        _ => return RespValue::error("ERR invalid error rate"),
    };

    if stores.blooms.contains_key(&name) {
        return RespValue::error("ERR filter already exists");
    }
    stores
        .blooms
        .insert(name, BloomFilter::reserve(capacity as usize, error_rate));
    RespValue::ok()
}

/// BF.MADD name item [item …] → array of was-new flags. An unreserved
/// filter is created with the default sizing.
fn cmd_bf_madd(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() < 2 {
        return arity_error("bf.madd");
    }
    let name = match arg_str(&args[0]) {
        Some(n) => n,
        None => return RespValue::error("ERR invalid argument"),
    };

    let filter = stores
        .blooms
        .entry(name)
        .or_insert_with(BloomFilter::with_defaults);

    let mut flags = Vec::with_capacity(args.len() - 1);
    for arg in &args[1..] {
        match arg_str(arg) {
            Some(item) => flags.push(RespValue::integer(i64::from(filter.madd(&item)))),
            None => return RespValue::error("ERR invalid argument"),
        }
    }
    RespValue::array(flags)
}

/// BF.EXISTS name item → :0 or :1 (a missing filter holds nothing).
fn cmd_bf_exists(stores: &mut Stores, args: &[RespValue]) -> RespValue {
    if args.len() != 2 {
        return arity_error("bf.exists");
    }
    let (name, item) = match (arg_str(&args[0]), arg_str(&args[1])) {
        (Some(n), Some(i)) => (n, i),
        _ => return RespValue::error("ERR invalid argument"),
    };

    let present = stores.blooms.get(&name).is_some_and(|f| f.exists(&item));
    RespValue::integer(i64::from(present))
}

/// Renders a score the way clients expect: integral values without a
/// trailing `.0`.
fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.abs() < 1e15 {
        format!("{}", score as i64)
    } else {
        score.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Dict, DictOptions, EvictionPolicy};
    use bytes::Bytes;

    fn test_stores() -> Stores {
        Stores::new(Dict::with_defaults(), 64)
    }

    fn stores_with_ceiling(max_keys: usize) -> Stores {
        let dict = Dict::new(DictOptions {
            max_keys,
            eviction_ratio: 0.1,
            policy: EvictionPolicy::AllkeysRandom,
            ..DictOptions::default()
        });
        Stores::new(dict, 64)
    }

    fn exec(stores: &mut Stores, parts: &[&str]) -> RespValue {
        let frame = RespValue::array(
            parts
                .iter()
                .map(|p| RespValue::bulk_string(Bytes::from(p.to_string())))
                .collect(),
        );
        execute(stores, frame)
    }

    #[test]
    fn ping_replies_pong_or_echoes() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["PING"]), RespValue::pong());
        assert_eq!(exec(&mut s, &["PING", "hello"]), RespValue::bulk_string("hello"));
        assert!(matches!(exec(&mut s, &["PING", "a", "b"]), RespValue::Error(_)));
    }

    #[test]
    fn set_then_get_round_trip() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["SET", "foo", "bar"]).serialize(), b"+OK\r\n");
        assert_eq!(exec(&mut s, &["GET", "foo"]).serialize(), b"$3\r\nbar\r\n");
    }

    #[test]
    fn get_missing_key_is_nil() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["GET", "nope"]).serialize(), b"$-1\r\n");
    }

    #[test]
    fn command_names_are_case_insensitive() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["set", "k", "v"]), RespValue::ok());
        assert_eq!(exec(&mut s, &["GeT", "k"]), RespValue::bulk_string("v"));
    }

    #[test]
    fn set_arity_errors() {
        let mut s = test_stores();
        for bad in [
            vec!["SET"],
            vec!["SET", "k"],
            vec!["SET", "k", "v", "EX"],
            vec!["SET", "k", "v", "EX", "1", "extra"],
        ] {
            let reply = exec(&mut s, &bad);
            assert_eq!(
                reply,
                RespValue::error("ERR wrong number of arguments for 'set' command"),
                "args: {bad:?}"
            );
        }
    }

    #[test]
    fn set_with_ttl_reports_remaining_seconds() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["SET", "k", "v", "EX", "10"]), RespValue::ok());
        assert_eq!(exec(&mut s, &["TTL", "k"]), RespValue::integer(10));
    }

    #[test]
    fn set_flag_token_is_ignored() {
        // The third token after the value is reserved; only the fourth
        // (seconds) is interpreted.
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["SET", "k", "v", "WHATEVER", "10"]), RespValue::ok());
        assert_eq!(exec(&mut s, &["TTL", "k"]), RespValue::integer(10));
    }

    #[test]
    fn set_with_bad_ttl_is_an_integer_error() {
        let mut s = test_stores();
        assert_eq!(
            exec(&mut s, &["SET", "k", "v", "EX", "soon"]),
            RespValue::error("ERR value is not an integer or out of range")
        );
    }

    #[test]
    fn expired_key_reads_as_absent_everywhere() {
        let mut s = test_stores();
        exec(&mut s, &["SET", "k", "v", "EX", "0"]);
        assert_eq!(exec(&mut s, &["GET", "k"]).serialize(), b"$-1\r\n");
        assert_eq!(exec(&mut s, &["TTL", "k"]), RespValue::integer(-2));
        assert_eq!(exec(&mut s, &["EXISTS", "k"]), RespValue::integer(0));
    }

    #[test]
    fn ttl_distinguishes_missing_and_persistent() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["TTL", "ghost"]), RespValue::integer(-2));
        exec(&mut s, &["SET", "k", "v"]);
        assert_eq!(exec(&mut s, &["TTL", "k"]), RespValue::integer(-1));
    }

    #[test]
    fn expire_attaches_ttl_to_existing_keys_only() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["EXPIRE", "ghost", "10"]), RespValue::integer(0));

        exec(&mut s, &["SET", "k", "v"]);
        assert_eq!(exec(&mut s, &["EXPIRE", "k", "10"]), RespValue::integer(1));
        assert_eq!(exec(&mut s, &["TTL", "k"]), RespValue::integer(10));

        assert_eq!(
            exec(&mut s, &["EXPIRE", "k", "ten"]),
            RespValue::error("ERR value is not an integer or out of range")
        );
    }

    #[test]
    fn del_counts_removed_keys() {
        let mut s = test_stores();
        exec(&mut s, &["SET", "a", "1"]);
        exec(&mut s, &["SET", "b", "2"]);
        assert_eq!(exec(&mut s, &["DEL", "a", "b", "c"]), RespValue::integer(2));
        assert_eq!(exec(&mut s, &["DEL", "a"]), RespValue::integer(0));
    }

    #[test]
    fn exists_counts_live_keys() {
        let mut s = test_stores();
        exec(&mut s, &["SET", "a", "1"]);
        exec(&mut s, &["SET", "b", "2"]);
        assert_eq!(
            exec(&mut s, &["EXISTS", "a", "b", "ghost", "a"]),
            RespValue::integer(3)
        );
    }

    #[test]
    fn info_reports_keyspace_counts() {
        let mut s = test_stores();
        exec(&mut s, &["SET", "a", "1"]);
        exec(&mut s, &["SET", "b", "2", "EX", "100"]);
        let reply = exec(&mut s, &["INFO"]);
        let text = reply.as_str().unwrap().to_string();
        assert!(text.contains("# Keyspace"));
        assert!(text.contains("db0:keys=2,expires=1"));
    }

    #[test]
    fn unknown_command_reply() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["FROB", "x"]).serialize(), b"-CMD NOT FOUND\r\n");
    }

    #[test]
    fn ceiling_keeps_population_bounded() {
        let mut s = stores_with_ceiling(10);
        for i in 0..=10 {
            let key = format!("k{i}");
            exec(&mut s, &["SET", &key, "v"]);
        }
        let mut present = 0;
        for i in 0..=10 {
            let key = format!("k{i}");
            if exec(&mut s, &["GET", &key]) != RespValue::Null {
                present += 1;
            }
        }
        assert_eq!(present, 10);
        // The newest key always survives the insert that evicted.
        assert_eq!(exec(&mut s, &["GET", "k10"]), RespValue::bulk_string("v"));
    }

    #[test]
    fn zadd_zrank_track_score_order() {
        let mut s = test_stores();
        for (score, member) in [("10", "a"), ("20", "b"), ("15", "c"), ("5", "d"), ("25", "e")] {
            assert_eq!(exec(&mut s, &["ZADD", "z", score, member]), RespValue::integer(1));
        }
        assert_eq!(exec(&mut s, &["ZRANK", "z", "d"]), RespValue::integer(0));
        assert_eq!(exec(&mut s, &["ZRANK", "z", "a"]), RespValue::integer(1));
        assert_eq!(exec(&mut s, &["ZRANK", "z", "c"]), RespValue::integer(2));
        assert_eq!(exec(&mut s, &["ZRANK", "z", "b"]), RespValue::integer(3));
        assert_eq!(exec(&mut s, &["ZRANK", "z", "e"]), RespValue::integer(4));

        // Repositioning one member shifts the others down.
        exec(&mut s, &["ZADD", "z", "100", "a"]);
        assert_eq!(exec(&mut s, &["ZRANK", "z", "a"]), RespValue::integer(4));
        assert_eq!(exec(&mut s, &["ZRANK", "z", "d"]), RespValue::integer(0));
        assert_eq!(exec(&mut s, &["ZRANK", "z", "c"]), RespValue::integer(1));
        assert_eq!(exec(&mut s, &["ZRANK", "z", "b"]), RespValue::integer(2));
        assert_eq!(exec(&mut s, &["ZRANK", "z", "e"]), RespValue::integer(3));
    }

    #[test]
    fn zadd_is_idempotent_per_score() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["ZADD", "z", "1.5", "m"]), RespValue::integer(1));
        assert_eq!(exec(&mut s, &["ZADD", "z", "1.5", "m"]), RespValue::integer(1));
        assert_eq!(exec(&mut s, &["ZSCORE", "z", "m"]), RespValue::bulk_string("1.5"));
    }

    #[test]
    fn zscore_formats_integral_scores_plainly() {
        let mut s = test_stores();
        exec(&mut s, &["ZADD", "z", "10", "m"]);
        assert_eq!(exec(&mut s, &["ZSCORE", "z", "m"]), RespValue::bulk_string("10"));
    }

    #[test]
    fn zscore_and_zrank_miss_as_nil() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["ZSCORE", "ghost", "m"]), RespValue::Null);
        assert_eq!(exec(&mut s, &["ZRANK", "ghost", "m"]), RespValue::Null);
        exec(&mut s, &["ZADD", "z", "1", "a"]);
        assert_eq!(exec(&mut s, &["ZSCORE", "z", "missing"]), RespValue::Null);
        assert_eq!(exec(&mut s, &["ZRANK", "z", "missing"]), RespValue::Null);
    }

    #[test]
    fn zadd_rejects_bad_scores() {
        let mut s = test_stores();
        assert_eq!(
            exec(&mut s, &["ZADD", "z", "high", "m"]),
            RespValue::error("ERR value is not a valid float")
        );
        assert_eq!(
            exec(&mut s, &["ZADD", "z", "nan", "m"]),
            RespValue::error("ERR value is not a valid float")
        );
    }

    #[test]
    fn simple_set_command_family() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["SADD", "s", "a", "b", "a"]), RespValue::integer(2));
        assert_eq!(exec(&mut s, &["SISMEMBER", "s", "a"]), RespValue::integer(1));
        assert_eq!(exec(&mut s, &["SISMEMBER", "s", "z"]), RespValue::integer(0));
        assert_eq!(
            exec(&mut s, &["SMEMBERS", "s"]),
            RespValue::array(vec![
                RespValue::bulk_string("a"),
                RespValue::bulk_string("b"),
            ])
        );
        assert_eq!(exec(&mut s, &["SREM", "s", "a", "z"]), RespValue::integer(1));
        assert_eq!(exec(&mut s, &["SISMEMBER", "s", "a"]), RespValue::integer(0));
    }

    #[test]
    fn smembers_of_missing_set_is_empty_array() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["SMEMBERS", "ghost"]), RespValue::array(vec![]));
        assert_eq!(exec(&mut s, &["SREM", "ghost", "m"]), RespValue::integer(0));
    }

    #[test]
    fn cms_incrby_then_query() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["CMS.INITBYDIM", "cms", "2000", "5"]), RespValue::ok());
        assert_eq!(
            exec(&mut s, &["CMS.INCRBY", "cms", "apple", "3", "banana", "2"]),
            RespValue::array(vec![RespValue::integer(3), RespValue::integer(2)])
        );
        assert_eq!(
            exec(&mut s, &["CMS.QUERY", "cms", "apple", "banana"]).serialize(),
            b"*2\r\n:3\r\n:2\r\n"
        );
    }

    #[test]
    fn cms_initbyprob_and_reinit_rules() {
        let mut s = test_stores();
        assert_eq!(
            exec(&mut s, &["CMS.INITBYPROB", "cms", "0.001", "0.01"]),
            RespValue::ok()
        );
        assert_eq!(
            exec(&mut s, &["CMS.INITBYPROB", "cms", "0.001", "0.01"]),
            RespValue::error("ERR sketch already exists")
        );
        assert_eq!(
            exec(&mut s, &["CMS.INITBYPROB", "other", "2.0", "0.01"]),
            RespValue::error("ERR invalid probability")
        );
    }

    #[test]
    fn cms_requires_initialization() {
        let mut s = test_stores();
        assert_eq!(
            exec(&mut s, &["CMS.INCRBY", "ghost", "x", "1"]),
            RespValue::error("ERR no such sketch")
        );
        assert_eq!(
            exec(&mut s, &["CMS.QUERY", "ghost", "x"]),
            RespValue::error("ERR no such sketch")
        );
    }

    #[test]
    fn cms_incrby_requires_full_pairs() {
        let mut s = test_stores();
        exec(&mut s, &["CMS.INITBYDIM", "cms", "100", "4"]);
        assert_eq!(
            exec(&mut s, &["CMS.INCRBY", "cms", "apple"]),
            RespValue::error("ERR wrong number of arguments for 'cms.incrby' command")
        );
        assert_eq!(
            exec(&mut s, &["CMS.INCRBY", "cms", "apple", "two"]),
            RespValue::error("ERR value is not an integer or out of range")
        );
    }

    #[test]
    fn bloom_reserve_madd_exists() {
        let mut s = test_stores();
        assert_eq!(exec(&mut s, &["BF.RESERVE", "bf", "100", "0.01"]), RespValue::ok());
        assert_eq!(
            exec(&mut s, &["BF.MADD", "bf", "x", "y", "z"]).serialize(),
            b"*3\r\n:1\r\n:1\r\n:1\r\n"
        );
        assert_eq!(exec(&mut s, &["BF.EXISTS", "bf", "x"]), RespValue::integer(1));
        assert_eq!(exec(&mut s, &["BF.EXISTS", "bf", "q"]), RespValue::integer(0));
    }

    #[test]
    fn bloom_madd_reports_repeats() {
        let mut s = test_stores();
        exec(&mut s, &["BF.RESERVE", "bf", "100", "0.01"]);
        exec(&mut s, &["BF.MADD", "bf", "x"]);
        assert_eq!(
            exec(&mut s, &["BF.MADD", "bf", "x", "new"]),
            RespValue::array(vec![RespValue::integer(0), RespValue::integer(1)])
        );
    }

    #[test]
    fn bloom_madd_auto_reserves_with_defaults() {
        let mut s = test_stores();
        assert_eq!(
            exec(&mut s, &["BF.MADD", "implicit", "x"]),
            RespValue::array(vec![RespValue::integer(1)])
        );
        assert_eq!(exec(&mut s, &["BF.EXISTS", "implicit", "x"]), RespValue::integer(1));
    }

    #[test]
    fn bloom_reserve_validates_arguments() {
        let mut s = test_stores();
        assert_eq!(
            exec(&mut s, &["BF.RESERVE", "bf", "zero", "0.01"]),
            RespValue::error("ERR value is not an integer or out of range")
        );
        assert_eq!(
            exec(&mut s, &["BF.RESERVE", "bf", "100", "1.5"]),
            RespValue::error("ERR invalid error rate")
        );
        exec(&mut s, &["BF.RESERVE", "bf", "100", "0.01"]);
        assert_eq!(
            exec(&mut s, &["BF.RESERVE", "bf", "100", "0.01"]),
            RespValue::error("ERR filter already exists")
        );
    }

    #[test]
    fn non_array_frames_are_rejected() {
        let mut s = test_stores();
        assert!(matches!(
            execute(&mut s, RespValue::integer(7)),
            RespValue::Error(_)
        ));
        assert!(matches!(
            execute(&mut s, RespValue::array(vec![])),
            RespValue::Error(_)
        ));
    }

    #[test]
    fn score_formatting() {
        assert_eq!(format_score(10.0), "10");
        assert_eq!(format_score(-3.0), "-3");
        assert_eq!(format_score(1.5), "1.5");
        assert_eq!(format_score(0.0), "0");
    }
}
