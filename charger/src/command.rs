//! Line based serial protocol of the charger.
//!
//! Single letter commands query or control the charger, `<key>?<value>` sets a parameter. Every
//! request is answered with exactly one line, either a status record or a [`ResponseCode`].

use core::fmt;

use drivers_shared::sense::ChargerHardware;

use crate::controller::{Charger, Status};
use crate::profile::BatteryType;

pub const HELP: &str = "To start charging set type of battery.
  a - get all; ({current}, {voltage}, {needed current}, {percent}, {pwm}, {type}, {state})
    Battery types: 0 - None, 1 - LiIon, 2 - AGM;
    Charging states: 0 - charging, 1 - idle, 2 - full, 3 - error
  t?x - set type of battery to x; (1 - 2)
  i?x - set needed current to x; (0 - 20A)
  h or help - this message;
  x - stop; (0 - success)
  r - reset; (0 - success)
  Codes: 1 - wrong request; 2 - wrong value; 3 - unknown error; 4 - battery full; 5 - current overflow;";

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, num_enum::IntoPrimitive)]
pub enum ResponseCode {
    Success = 0,
    WrongRequest = 1,
    WrongValue = 2,
    UnknownError = 3,
    BatteryFull = 4,
    CurrentOverflow = 5,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Request {
    Help,
    Query,
    Stop,
    Reset,
    SetNeededCurrent(f32),
    SetType(BatteryType),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Response {
    Code(ResponseCode),
    Status(Status),
    Help,
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Code(code) => write!(f, "{}", u8::from(*code)),
            Response::Status(s) => write!(
                f,
                "{:.2},{:.2},{:.2},{:.2},{},{},{}",
                s.current,
                s.voltage,
                s.needed_current,
                s.percent,
                s.pwm_duty,
                u8::from(s.battery_type),
                u8::from(s.state),
            ),
            Response::Help => f.write_str(HELP),
        }
    }
}

pub fn parse(line: &str) -> Result<Request, ResponseCode> {
    let line = line.trim();
    match line {
        "h" | "help" => return Ok(Request::Help),
        "a" => return Ok(Request::Query),
        "x" => return Ok(Request::Stop),
        "r" => return Ok(Request::Reset),
        _ => {}
    }

    let Some((key, value)) = line.split_once('?') else {
        return Err(ResponseCode::WrongRequest);
    };
    if key.len() != 1 || value.is_empty() {
        return Err(ResponseCode::WrongRequest);
    }

    match key {
        "i" => value
            .trim()
            .parse::<f32>()
            .map(Request::SetNeededCurrent)
            .map_err(|_| ResponseCode::WrongValue),
        "t" => value
            .trim()
            .parse::<u8>()
            .ok()
            .and_then(|v| BatteryType::try_from(v).ok())
            .map(Request::SetType)
            .ok_or(ResponseCode::WrongValue),
        _ => Err(ResponseCode::WrongRequest),
    }
}

pub fn execute<H: ChargerHardware>(charger: &mut Charger<H>, request: Request) -> Response {
    let result = match request {
        Request::Help => return Response::Help,
        Request::Query => return Response::Status(charger.status()),
        Request::Stop => {
            charger.stop(None);
            Ok(())
        }
        Request::Reset => {
            charger.reset();
            Ok(())
        }
        Request::SetNeededCurrent(current) => charger.set_needed_current(current),
        Request::SetType(battery_type) => charger.set_type(battery_type),
    };

    Response::Code(match result {
        Ok(()) => ResponseCode::Success,
        Err(e) => {
            log::warn!("Request {:?} rejected: {}", request, e);
            ResponseCode::WrongValue
        }
    })
}

/// Answers one received line. Blank lines are ignored.
pub fn handle<H: ChargerHardware>(charger: &mut Charger<H>, line: &str) -> Option<Response> {
    if line.trim().is_empty() {
        return None;
    }
    Some(match parse(line) {
        Ok(request) => execute(charger, request),
        Err(code) => {
            log::debug!("Unknown request {:?}", line);
            Response::Code(code)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::tests::{charger, set_readings};
    use crate::controller::BatteryState;

    #[track_caller]
    fn assert_parse(line: &str, expected: Result<Request, ResponseCode>) {
        assert_eq!(parse(line), expected);
    }

    #[test]
    fn test_parse() {
        assert_parse("a", Ok(Request::Query));
        assert_parse(" x\r", Ok(Request::Stop));
        assert_parse("r", Ok(Request::Reset));
        assert_parse("h", Ok(Request::Help));
        assert_parse("help", Ok(Request::Help));
        assert_parse("i?10", Ok(Request::SetNeededCurrent(10.0)));
        assert_parse("i?2.5", Ok(Request::SetNeededCurrent(2.5)));
        assert_parse("i?-1", Ok(Request::SetNeededCurrent(-1.0)));
        assert_parse("t?1", Ok(Request::SetType(BatteryType::LiIon)));
        assert_parse("t?2", Ok(Request::SetType(BatteryType::Agm)));
        assert_parse("t?0", Ok(Request::SetType(BatteryType::None)));
    }

    #[test]
    fn test_parse_rejects() {
        assert_parse("q", Err(ResponseCode::WrongRequest));
        assert_parse("ax", Err(ResponseCode::WrongRequest));
        assert_parse("i?", Err(ResponseCode::WrongRequest));
        assert_parse("?1", Err(ResponseCode::WrongRequest));
        assert_parse("ii?1", Err(ResponseCode::WrongRequest));
        assert_parse("z?1", Err(ResponseCode::WrongRequest));
        assert_parse("i?abc", Err(ResponseCode::WrongValue));
        assert_parse("t?3", Err(ResponseCode::WrongValue));
        assert_parse("t?x", Err(ResponseCode::WrongValue));
    }

    #[test]
    fn test_response_format() {
        assert_eq!(Response::Code(ResponseCode::Success).to_string(), "0");
        assert_eq!(Response::Code(ResponseCode::CurrentOverflow).to_string(), "5");
        assert!(Response::Help.to_string().starts_with("To start charging"));
        assert!(HELP.contains("t?x"));
    }

    #[test]
    fn test_query() {
        let mut c = charger();
        assert_eq!(
            handle(&mut c, "a").unwrap().to_string(),
            "0.00,0.00,0.00,0.00,0,0,1"
        );

        assert_eq!(handle(&mut c, "t?1").unwrap().to_string(), "0");
        set_readings(&mut c, 12.4, 6.0);
        assert_eq!(
            handle(&mut c, "a").unwrap().to_string(),
            "5.98,12.41,6.00,0.00,50,1,0"
        );
    }

    #[test]
    fn test_set_needed_current() {
        let mut c = charger();
        c.set_type(BatteryType::LiIon).unwrap();
        assert_eq!(handle(&mut c, "i?-1").unwrap().to_string(), "2");
        assert_eq!(handle(&mut c, "i?25").unwrap().to_string(), "2");
        assert_eq!(handle(&mut c, "i?nan").unwrap().to_string(), "2");
        assert_eq!(c.needed_current(), 12.0);
        assert_eq!(handle(&mut c, "i?10").unwrap().to_string(), "0");
        assert_eq!(c.needed_current(), 10.0);
    }

    #[test]
    fn test_stop_and_reset() {
        let mut c = charger();
        c.set_type(BatteryType::Agm).unwrap();
        assert_eq!(handle(&mut c, "x"), Some(Response::Code(ResponseCode::Success)));
        assert_eq!(c.pwm_duty(), 0);
        assert_eq!(c.battery_type(), BatteryType::Agm);

        assert_eq!(handle(&mut c, "r"), Some(Response::Code(ResponseCode::Success)));
        assert_eq!(c.battery_type(), BatteryType::None);
        assert_eq!(c.state(), BatteryState::Idle);
    }

    #[test]
    fn test_set_type() {
        let mut c = charger();
        assert_eq!(handle(&mut c, "t?0").unwrap().to_string(), "2");
        assert_eq!(c.state(), BatteryState::Idle);
        assert_eq!(handle(&mut c, "t?2").unwrap().to_string(), "0");
        assert_eq!(c.battery_type(), BatteryType::Agm);
        assert_eq!(c.state(), BatteryState::Charging);
    }

    #[test]
    fn test_unknown_and_blank() {
        let mut c = charger();
        assert_eq!(handle(&mut c, "hello").unwrap().to_string(), "1");
        assert_eq!(handle(&mut c, "k?1").unwrap().to_string(), "1");
        assert_eq!(handle(&mut c, ""), None);
        assert_eq!(handle(&mut c, " \r"), None);
        assert_eq!(handle(&mut c, "help"), Some(Response::Help));
    }
}
