//! `LocalDate`, `LocalTime`, `LocalDateTime`, `Instant` builtin classes
//! (`SPEC_FULL.md` §4.4 ambient addition). Gated behind
//! `VmConfig::install_datetime_classes`; spec.md §3.1 names these tags but
//! leaves their method catalogue unspecified, so this is built the same
//! way the rest of the builtin surface is: construction, accessors, a
//! debug `toString`, and `compare`/`equals` wired into the same dispatch
//! chain as every other class.

use crate::builtins::support::{arg, expect_int, new_string};
use slate_core::error::{RuntimeError, RuntimeResult};
use slate_core::gc::Gc;
use slate_core::heap::class::ClassDef;
use slate_core::heap::datetime::{Instant, LocalDate, LocalDateTime, LocalTime};
use slate_core::value::{NativeContext, Value};

fn expect_date(v: &Value) -> RuntimeResult<Gc<LocalDate>> {
    match v {
        Value::LocalDate(d) => Ok(d.clone()),
        other => Err(RuntimeError::type_error(format!("expected a LocalDate, got {}", other.type_name()))),
    }
}

fn expect_time(v: &Value) -> RuntimeResult<Gc<LocalTime>> {
    match v {
        Value::LocalTime(t) => Ok(t.clone()),
        other => Err(RuntimeError::type_error(format!("expected a LocalTime, got {}", other.type_name()))),
    }
}

fn expect_date_time(v: &Value) -> RuntimeResult<Gc<LocalDateTime>> {
    match v {
        Value::LocalDateTime(dt) => Ok(dt.clone()),
        other => Err(RuntimeError::type_error(format!("expected a LocalDateTime, got {}", other.type_name()))),
    }
}

fn expect_instant(v: &Value) -> RuntimeResult<Gc<Instant>> {
    match v {
        Value::Instant(i) => Ok(i.clone()),
        other => Err(RuntimeError::type_error(format!("expected an Instant, got {}", other.type_name()))),
    }
}

fn date_year(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(expect_date(arg(args, 0)?)?.borrow().year()))
}

fn date_month(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(expect_date(arg(args, 0)?)?.borrow().month() as i32))
}

fn date_day(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(expect_date(arg(args, 0)?)?.borrow().day() as i32))
}

fn date_plus_days(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let d = expect_date(arg(args, 0)?)?;
    let days = expect_int(arg(args, 1)?)?;
    let next = d
        .borrow()
        .plus_days(days)
        .ok_or_else(|| RuntimeError::range_error("LocalDate.plusDays() out of representable range"))?;
    Ok(Value::LocalDate(Gc::new(next)))
}

fn date_to_string(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(new_string(expect_date(arg(args, 0)?)?.borrow().to_iso_string()))
}

fn date_compare(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = expect_date(arg(args, 0)?)?;
    let b = expect_date(arg(args, 1)?)?;
    Ok(Value::Int32(a.borrow().compare(&b.borrow()) as i32))
}

fn date_equals(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = expect_date(arg(args, 0)?)?;
    Ok(Value::Boolean(match arg(args, 1)? {
        Value::LocalDate(b) => *a.borrow() == *b.borrow(),
        _ => false,
    }))
}

/// `LocalDate(year, month, day)`.
fn factory_local_date(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let year = expect_int(arg(args, 0)?)? as i32;
    let month = expect_int(arg(args, 1)?)? as u32;
    let day = expect_int(arg(args, 2)?)? as u32;
    let date = LocalDate::from_ymd(year, month, day)
        .ok_or_else(|| RuntimeError::value_error(format!("{year:04}-{month:02}-{day:02} is not a valid date")))?;
    Ok(Value::LocalDate(Gc::new(date)))
}

fn time_hour(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(expect_time(arg(args, 0)?)?.borrow().hour() as i32))
}

fn time_minute(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(expect_time(arg(args, 0)?)?.borrow().minute() as i32))
}

fn time_second(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(expect_time(arg(args, 0)?)?.borrow().second() as i32))
}

fn time_to_string(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(new_string(expect_time(arg(args, 0)?)?.borrow().to_iso_string()))
}

fn time_compare(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = expect_time(arg(args, 0)?)?;
    let b = expect_time(arg(args, 1)?)?;
    Ok(Value::Int32(a.borrow().compare(&b.borrow()) as i32))
}

fn time_equals(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = expect_time(arg(args, 0)?)?;
    Ok(Value::Boolean(match arg(args, 1)? {
        Value::LocalTime(b) => *a.borrow() == *b.borrow(),
        _ => false,
    }))
}

/// `LocalTime(hour, minute, second)`.
fn factory_local_time(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let hour = expect_int(arg(args, 0)?)? as u32;
    let minute = expect_int(arg(args, 1)?)? as u32;
    let second = expect_int(arg(args, 2)?)? as u32;
    let time = LocalTime::from_hms(hour, minute, second)
        .ok_or_else(|| RuntimeError::value_error(format!("{hour:02}:{minute:02}:{second:02} is not a valid time")))?;
    Ok(Value::LocalTime(Gc::new(time)))
}

fn date_time_date(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::LocalDate(Gc::new(expect_date_time(arg(args, 0)?)?.borrow().date())))
}

fn date_time_time(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::LocalTime(Gc::new(expect_date_time(arg(args, 0)?)?.borrow().time())))
}

fn date_time_epoch_millis(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let millis = expect_date_time(arg(args, 0)?)?.borrow().to_epoch_millis();
    Ok(Value::BigInt(Gc::new(slate_core::bigint::BigInt::from_i64(millis))))
}

fn date_time_to_string(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(new_string(expect_date_time(arg(args, 0)?)?.borrow().to_iso_string()))
}

fn date_time_compare(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = expect_date_time(arg(args, 0)?)?;
    let b = expect_date_time(arg(args, 1)?)?;
    Ok(Value::Int32(a.borrow().compare(&b.borrow()) as i32))
}

fn date_time_equals(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = expect_date_time(arg(args, 0)?)?;
    Ok(Value::Boolean(match arg(args, 1)? {
        Value::LocalDateTime(b) => *a.borrow() == *b.borrow(),
        _ => false,
    }))
}

/// `LocalDateTime(date, time)`.
fn factory_local_date_time(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let date = *expect_date(arg(args, 0)?)?.borrow();
    let time = *expect_time(arg(args, 1)?)?.borrow();
    Ok(Value::LocalDateTime(Gc::new(LocalDateTime::new(date, time))))
}

/// `LocalDateTime.now()`, bound to the VM's configured clock.
fn static_date_time_now(ctx: &mut dyn NativeContext, _args: &[Value]) -> RuntimeResult<Value> {
    let dt = LocalDateTime::from_epoch_millis(ctx.now_millis())
        .ok_or_else(|| RuntimeError::internal("system clock produced an unrepresentable instant"))?;
    Ok(Value::LocalDateTime(Gc::new(dt)))
}

fn instant_epoch_millis(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let millis = expect_instant(arg(args, 0)?)?.borrow().epoch_millis();
    Ok(Value::BigInt(Gc::new(slate_core::bigint::BigInt::from_i64(millis))))
}

fn instant_plus_millis(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let instant = expect_instant(arg(args, 0)?)?;
    let delta = expect_int(arg(args, 1)?)?;
    let next = instant
        .borrow()
        .plus_millis(delta)
        .ok_or_else(|| RuntimeError::overflow_error("Instant.plusMillis() overflowed"))?;
    Ok(Value::Instant(Gc::new(next)))
}

fn instant_to_string(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(new_string(format!("Instant({})", expect_instant(arg(args, 0)?)?.borrow().epoch_millis())))
}

fn instant_compare(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = expect_instant(arg(args, 0)?)?;
    let b = expect_instant(arg(args, 1)?)?;
    Ok(Value::Int32(a.borrow().compare(&b.borrow()) as i32))
}

fn instant_equals(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = expect_instant(arg(args, 0)?)?;
    Ok(Value::Boolean(match arg(args, 1)? {
        Value::Instant(b) => *a.borrow() == *b.borrow(),
        _ => false,
    }))
}

/// `Instant(epochMillis)`.
fn factory_instant(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let millis = expect_int(arg(args, 0)?)?;
    Ok(Value::Instant(Gc::new(Instant::from_epoch_millis(millis))))
}

/// `Instant.now()`, bound to the VM's configured clock.
fn static_instant_now(ctx: &mut dyn NativeContext, _args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Instant(Gc::new(Instant::from_epoch_millis(ctx.now_millis()))))
}

pub fn local_date_class() -> ClassDef {
    let mut class = ClassDef::new("LocalDate");
    let p = class.prototype.clone();
    let mut p = p.borrow_mut();
    p.set("year", Value::Native(date_year));
    p.set("month", Value::Native(date_month));
    p.set("day", Value::Native(date_day));
    p.set("plusDays", Value::Native(date_plus_days));
    p.set("toString", Value::Native(date_to_string));
    p.set("compare", Value::Native(date_compare));
    p.set("equals", Value::Native(date_equals));
    drop(p);
    class.factory = Some(Value::Native(factory_local_date));
    class
}

pub fn local_time_class() -> ClassDef {
    let mut class = ClassDef::new("LocalTime");
    let p = class.prototype.clone();
    let mut p = p.borrow_mut();
    p.set("hour", Value::Native(time_hour));
    p.set("minute", Value::Native(time_minute));
    p.set("second", Value::Native(time_second));
    p.set("toString", Value::Native(time_to_string));
    p.set("compare", Value::Native(time_compare));
    p.set("equals", Value::Native(time_equals));
    drop(p);
    class.factory = Some(Value::Native(factory_local_time));
    class
}

pub fn local_date_time_class() -> ClassDef {
    let mut class = ClassDef::new("LocalDateTime");
    let p = class.prototype.clone();
    let mut p = p.borrow_mut();
    p.set("date", Value::Native(date_time_date));
    p.set("time", Value::Native(date_time_time));
    p.set("epochMillis", Value::Native(date_time_epoch_millis));
    p.set("toString", Value::Native(date_time_to_string));
    p.set("compare", Value::Native(date_time_compare));
    p.set("equals", Value::Native(date_time_equals));
    drop(p);
    class.statics.borrow_mut().set("now", Value::Native(static_date_time_now));
    class.factory = Some(Value::Native(factory_local_date_time));
    class
}

pub fn instant_class() -> ClassDef {
    let mut class = ClassDef::new("Instant");
    let p = class.prototype.clone();
    let mut p = p.borrow_mut();
    p.set("epochMillis", Value::Native(instant_epoch_millis));
    p.set("plusMillis", Value::Native(instant_plus_millis));
    p.set("toString", Value::Native(instant_to_string));
    p.set("compare", Value::Native(instant_compare));
    p.set("equals", Value::Native(instant_equals));
    drop(p);
    class.statics.borrow_mut().set("now", Value::Native(static_instant_now));
    class.factory = Some(Value::Native(factory_instant));
    class
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCtx(i64);
    impl NativeContext for FixedCtx {
        fn call(&mut self, _callee: &Value, _args: &[Value]) -> RuntimeResult<Value> {
            Err(RuntimeError::internal("no calls expected in this test"))
        }
        fn now_millis(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn instant_now_uses_injected_clock() {
        let mut ctx = FixedCtx(1_700_000_000_000);
        let now = static_instant_now(&mut ctx, &[]).unwrap();
        match now {
            Value::Instant(i) => assert_eq!(i.borrow().epoch_millis(), 1_700_000_000_000),
            other => panic!("expected an Instant, got {other:?}"),
        }
    }

    #[test]
    fn date_plus_days_round_trips() {
        let mut ctx = FixedCtx(0);
        let date = factory_local_date(&mut ctx, &[Value::Int32(2024), Value::Int32(2), Value::Int32(28)]).unwrap();
        let next = date_plus_days(&mut ctx, &[date, Value::Int32(1)]).unwrap();
        match next {
            Value::LocalDate(d) => assert_eq!(d.borrow().to_iso_string(), "2024-02-29"),
            other => panic!("expected a LocalDate, got {other:?}"),
        }
    }
}
