use crate::engine::mapping::record::{Bindings, Record};
use crate::engine::value::{FromValue, Value};
use crate::error::Error;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberDto {
    pub username: String,
    pub age: i64,
}

impl MemberDto {
    pub fn new(username: String, age: i64) -> Self {
        MemberDto { username, age }
    }

    pub fn set_username(&mut self, username: String) {
        self.username = username;
    }

    pub fn set_age(&mut self, age: i64) {
        self.age = age;
    }
}

impl Record for MemberDto {
    fn bindings() -> Bindings<Self> {
        Bindings::<Self>::new()
            .setter("username", |dto, value| {
                dto.set_username(String::from_value(value)?);
                Ok(())
            })
            .setter("age", |dto, value| {
                dto.set_age(i64::from_value(value)?);
                Ok(())
            })
            .field("username", |dto, value| {
                dto.username = String::from_value(value)?;
                Ok(())
            })
            .field("age", |dto, value| {
                dto.age = i64::from_value(value)?;
                Ok(())
            })
            .constructor(2, |values| {
                let [username, age] = arguments::<2>(values)?;

                Ok(MemberDto::new(
                    String::from_value(username)?,
                    i64::from_value(age)?,
                ))
            })
    }
}

/// Like [MemberDto], but with the username called `name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserDto {
    pub name: String,
    pub age: i64,
}

impl UserDto {
    pub fn new(name: String, age: i64) -> Self {
        UserDto { name, age }
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn set_age(&mut self, age: i64) {
        self.age = age;
    }
}

impl Record for UserDto {
    fn bindings() -> Bindings<Self> {
        Bindings::<Self>::new()
            .setter("name", |dto, value| {
                dto.set_name(String::from_value(value)?);
                Ok(())
            })
            .setter("age", |dto, value| {
                dto.set_age(i64::from_value(value)?);
                Ok(())
            })
            .field("name", |dto, value| {
                dto.name = String::from_value(value)?;
                Ok(())
            })
            .field("age", |dto, value| {
                dto.age = i64::from_value(value)?;
                Ok(())
            })
            .constructor(2, |values| {
                let [name, age] = arguments::<2>(values)?;

                Ok(UserDto::new(String::from_value(name)?, i64::from_value(age)?))
            })
    }
}

fn arguments<const N: usize>(values: Vec<Value>) -> Result<[Value; N], Error> {
    values
        .try_into()
        .map_err(|values: Vec<Value>| {
            Error::decode(format!("expected {N} arguments, got {}", values.len()))
        })
}
