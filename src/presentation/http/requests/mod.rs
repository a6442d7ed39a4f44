use poem_openapi::Object;

#[derive(Object, Debug)]
pub struct BindDeviceRequestDto {
    #[oai(validator(min_length = 1, max_length = 128))]
    pub push_id: String,
}
