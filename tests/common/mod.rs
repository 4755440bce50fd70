//! Shared sample messages for integration tests

#![allow(dead_code)]

use octofhir_hl7::Message;

/// Admission message with two next-of-kin segments; NK1 carries 34 fields
pub const ADT: &str = "MSH|^~\\&|SA|SF|RA|RF|20110613083617||ADT^O01|934576120110613083617|P|2.3\r\
EVN|A04|20110613083617|||\r\
PID|1||135769||MOUSE^MICKEY^||19281118|M|||123 Main St.^^Lake Buena Vista^FL^32830||(407)939-1289^^^theMainMouse@disney.com\r\
NK1|1|MOUSE^MINNIE^|32|SPO||||||||||||||||||||||||||||||\r\
NK1|2|DUCK^DONALD|FND\r\
PV1|1|O|||||7^Disney^Walt^^MD^^^^|||||||||||||||||||||||||||||||||||||||||||\r";

/// Order message with repeating attending doctors in PV1.7, newline separated
pub const ORM: &str = "MSH|^~\\&|EPIC||||20191107134803|ALEVIB01|ORM^O01|23|T|2.3|||||||||||\n\
PID|1||1005555^^^NYU MRN^MRN||OSTRICH^DODUO||19820605|M||U|000 PARK AVE SOUTH^^NEW YORK^NY^10010^US^^^60|60|(555)555-5555^HOME^PH|||S|||999-99-9999|||U||N||||||||\n\
PV1||O|NWSLED^^^NYULHLI^^^^^LI NW SLEEP DISORDER^^DEPID||||1447312459^DOE^MICHAEL^^^^^^EPIC^^^^PNPI~DOEM06^DOE^MICHAEL^^^^^^KID^^^^KID|1447312459^DOE^MICHAEL^^^^^^EPIC^^^^PNPI~DOEM06^DOE^MICHAEL^^^^^^KID^^^^KID|||||||||||496779945|||||||||||||||||||||||||20191107|||||||V";

/// CRLF separated message with an explicit null in EVN.4
pub const WITH_NULLS: &str = "MSH|^~\\&|SA|SF|RA|RF|20110613083617||ADT^A04|123|P|2.7||||\r\nEVN|A04|20110613083617||\"\"\r\n";

/// CRLF separated message with tabs inside field values
pub const WITH_TABS: &str = "MSH|^~\\&|Sending\tApplication|Sending\tFacility|RA|RF|20110613083617||ADT^A04|123|P|2.7||||\r\nEVN|A04|20110613083617\r\n";

pub fn parse(text: &str) -> Message {
    Message::parse(text).expect("sample message parses")
}
